//! Background tasks module
//!
//! This module contains the countdown ticker that drives a running session.

pub mod countdown_ticker;

// Re-export main types
pub use countdown_ticker::{CountdownTicker, RunId, Tick, TickerPhase, TICK_INTERVAL};
