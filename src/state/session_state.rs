//! Session state structure and derived flags

use serde::{Deserialize, Serialize};

use super::Timeout;

/// Whether the display is currently being kept awake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Stopped,
    Running(RunningSession),
}

impl SessionState {
    /// A fresh session with its full timeout remaining.
    pub fn running(timeout: Timeout) -> Self {
        SessionState::Running(RunningSession::new(timeout))
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running(_))
    }

    pub fn is_stopped(&self) -> bool {
        !self.is_running()
    }

    pub fn as_running(&self) -> Option<&RunningSession> {
        match self {
            SessionState::Running(session) => Some(session),
            SessionState::Stopped => None,
        }
    }
}

/// A running session.
///
/// `previous_remaining` is written together with `remaining` by
/// [`with_remaining`](Self::with_remaining), so a reader always sees a
/// consistent pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningSession {
    start_timeout: Timeout,
    remaining: Timeout,
    previous_remaining: Option<Timeout>,
}

impl RunningSession {
    pub fn new(timeout: Timeout) -> Self {
        Self {
            start_timeout: timeout,
            remaining: timeout,
            previous_remaining: None,
        }
    }

    pub fn start_timeout(&self) -> Timeout {
        self.start_timeout
    }

    pub fn remaining(&self) -> Timeout {
        self.remaining
    }

    pub fn previous_remaining(&self) -> Option<Timeout> {
        self.previous_remaining
    }

    /// Copy of this session with `remaining` updated and the old value
    /// recorded as `previous_remaining`.
    pub fn with_remaining(&self, remaining: Timeout) -> Self {
        Self {
            start_timeout: self.start_timeout,
            remaining,
            previous_remaining: Some(self.remaining),
        }
    }

    pub fn is_indefinite(&self) -> bool {
        self.remaining.is_indefinite()
    }

    /// True for the whole life of a finite session until it reaches zero.
    pub fn is_counting_down(&self) -> bool {
        self.start_timeout.is_finite() && self.remaining <= self.start_timeout
    }

    /// True while the remaining time sits exactly at the start value,
    /// i.e. right after a (re)start and before the first decrement.
    pub fn is_restarted(&self) -> bool {
        self.start_timeout.is_finite() && self.remaining == self.start_timeout
    }
}
