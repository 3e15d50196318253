//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{SessionState, SessionStatus, Timeout};

/// API response structure for action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionStatus,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, session: SessionStatus) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            session,
        }
    }

    /// Create a response describing the session after an action
    pub fn from_session(message: String, session: SessionStatus) -> Self {
        let status = if session.state.is_running() { "active" } else { "inactive" };
        Self::new(status.to_string(), message, session)
    }

    /// Create an error response
    pub fn error(message: String, session: SessionStatus) -> Self {
        Self::new("error".to_string(), message, session)
    }
}

/// Status response with countdown details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionState,
    pub selection: Timeout,
    pub remaining_seconds: Option<u64>,
    pub uptime: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Catalog listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsResponse {
    pub timeouts: Vec<Timeout>,
    pub selection: Timeout,
}

/// Optional body for start-like actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    pub timeout: Option<Timeout>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
