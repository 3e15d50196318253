//! Caffeine - keeps the display awake for a selected timeout
//!
//! This library provides the session state machine, the countdown ticker
//! that drives it, the status fan-out that reports every transition, and
//! the collaborators (keep-alive inhibitor, settings store, HTTP entry
//! points) that connect it to the outside world.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use controller::{Action, SessionController, SessionHandle};
pub use error::ControllerError;
pub use state::{SessionState, SessionStatus, Timeout, TimeoutCatalog};
pub use utils::signals::shutdown_signal;
