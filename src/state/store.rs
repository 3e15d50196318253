//! The single owner of session state and the timeout selection

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SessionState, StatusFanout, Timeout, TimeoutCatalog};

/// Snapshot handed to observers after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub selection: Timeout,
}

/// Holds the session state, the timeout catalog and the observer registry.
///
/// [`replace`](Self::replace) is the only way to change the session
/// state, and it notifies the fan-out before returning.
#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
    catalog: TimeoutCatalog,
    fanout: StatusFanout,
}

impl SessionStore {
    pub fn new(catalog: TimeoutCatalog, fanout: StatusFanout) -> Self {
        Self {
            state: SessionState::Stopped,
            catalog,
            fanout,
        }
    }

    pub fn current(&self) -> SessionState {
        self.state
    }

    pub fn catalog(&self) -> &TimeoutCatalog {
        &self.catalog
    }

    pub fn fanout(&self) -> &StatusFanout {
        &self.fanout
    }

    pub fn selection(&self) -> Timeout {
        self.catalog.selection()
    }

    /// Move the catalog selection. Does not notify; the following
    /// `replace` publishes it together with the new state.
    pub fn select(&mut self, timeout: Timeout) -> Timeout {
        self.catalog.select(timeout)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            selection: self.catalog.selection(),
        }
    }

    /// Swap in `state` and notify every observer.
    ///
    /// Entering `Stopped` also returns the selection to the first timeout.
    pub fn replace(&mut self, state: SessionState) {
        if state.is_stopped() {
            self.catalog.reset_selection();
        }
        debug!(previous = ?self.state, next = ?state, "Session state replaced");
        self.state = state;
        self.fanout.notify(&self.status());
    }
}
