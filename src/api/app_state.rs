//! Shared state for the HTTP handlers

use std::{sync::Mutex, time::Instant};

use chrono::{DateTime, Utc};

use crate::controller::SessionHandle;

/// What the HTTP layer needs: the session actor plus server metadata.
#[derive(Debug)]
pub struct AppState {
    pub session: SessionHandle,
    pub start_time: Instant,
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            start_time: Instant::now(),
            last_action: Mutex::new(None),
        }
    }

    /// Remember the most recent action for the status endpoint
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last) = self.last_action.lock() {
            *last = Some((action.to_string(), Utc::now()));
        }
    }

    /// Get last action information
    pub fn last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|last| last.clone()) {
            Some((action, time)) => (Some(action), Some(time)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
