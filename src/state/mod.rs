//! State management module
//!
//! This module contains the session data model, the timeout catalog and the
//! status fan-out, all owned by the [`SessionStore`].

pub mod catalog;
pub mod fanout;
pub mod session_state;
pub mod store;
pub mod timeout;

// Re-export main types
pub use catalog::{TimeoutCatalog, DEFAULT_TIMEOUTS};
pub use fanout::{ObserverId, StatusFanout, StatusObserver};
pub use session_state::{RunningSession, SessionState};
pub use store::{SessionStatus, SessionStore};
pub use timeout::Timeout;
