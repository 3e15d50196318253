//! Session controller module
//!
//! This module contains the session state machine and the actor that runs it.

pub mod actions;
pub mod handle;
pub mod session_controller;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use actions::{plan_advance, Action, AdvanceStep};
pub use handle::SessionHandle;
pub use session_controller::{ControllerOptions, SessionController, DEFAULT_DEBOUNCE_WINDOW};
