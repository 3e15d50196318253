//! Error types shared across the crate

use std::{io, path::PathBuf};

/// Malformed timeout text from the CLI, the settings file or an API request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTimeoutError {
    #[error("empty timeout")]
    Empty,

    #[error("invalid timeout '{0}' (expected e.g. 30s, 5m, 1h or indefinite)")]
    Invalid(String),
}

/// Action name not understood by the controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

/// Failure of the keep-alive collaborator.
#[derive(Debug, thiserror::Error)]
pub enum KeepAliveError {
    #[error("keep-alive inhibitor is not available: {0}")]
    Unavailable(String),

    #[error("failed to spawn keep-alive inhibitor: {0}")]
    Spawn(#[source] io::Error),
}

/// Failure of the settings store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure surfaced to the caller of a session action.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The keep-alive resource could not be acquired, even after a retry.
    /// The session has been left stopped.
    #[error("could not keep the display awake: {0}")]
    KeepAlive(#[from] KeepAliveError),

    /// The session actor has shut down.
    #[error("session controller is no longer running")]
    Closed,
}
