//! External collaborator module
//!
//! This module contains the keep-alive resource implementations, the
//! settings store and the built-in status observers.

pub mod keep_alive;
pub mod observers;
pub mod settings;

// Re-export main types
pub use keep_alive::{check_inhibit_available, DryRunKeepAlive, KeepAlive, SystemdInhibitor};
pub use observers::{LogObserver, SettingsObserver, WatchObserver};
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsStore};
