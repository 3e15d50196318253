//! Test doubles for controller collaborators

use std::sync::{Arc, Mutex};

use crate::{error::KeepAliveError, services::KeepAlive, state::Timeout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepAliveEvent {
    Acquire(Timeout, bool),
    Release,
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<KeepAliveEvent>,
    failures: usize,
}

/// Records successful acquires and every release; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingKeepAlive {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingKeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` acquire attempts fail.
    pub fn fail_next(&self, count: usize) {
        self.inner.lock().unwrap().failures = count;
    }

    pub fn events(&self) -> Vec<KeepAliveEvent> {
        self.inner.lock().unwrap().events.clone()
    }
}

impl KeepAlive for RecordingKeepAlive {
    fn acquire(&mut self, timeout: Timeout, dim: bool) -> Result<(), KeepAliveError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failures > 0 {
            inner.failures -= 1;
            return Err(KeepAliveError::Unavailable("simulated failure".to_string()));
        }
        inner.events.push(KeepAliveEvent::Acquire(timeout, dim));
        Ok(())
    }

    fn release(&mut self) {
        self.inner.lock().unwrap().events.push(KeepAliveEvent::Release);
    }
}
