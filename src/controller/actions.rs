//! Session actions and the advance-timeout decision table

use std::{str::FromStr, time::Duration};

use crate::{
    error::UnknownAction,
    state::{SessionState, Timeout, TimeoutCatalog},
};

/// A request to change the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// End the session and release the display.
    Stop,
    /// Stop if running, otherwise start with the current selection.
    Toggle,
    /// Start (or restart) immediately, optionally selecting `timeout` first.
    StartNow { timeout: Option<Timeout> },
    /// Like `StartNow`, but the countdown begins after `delay`.
    StartDelayed {
        timeout: Option<Timeout>,
        delay: Duration,
    },
    /// Reset the countdown to its start value after the debounce window.
    Restart { timeout: Option<Timeout> },
    /// Move to another timeout. `debounce` marks a rapid repeated request.
    AdvanceTimeout { debounce: bool },
}

impl Action {
    pub fn start() -> Self {
        Action::StartNow { timeout: None }
    }

    pub fn start_with(timeout: Timeout) -> Self {
        Action::StartNow {
            timeout: Some(timeout),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Stop => "stop",
            Action::Toggle => "toggle",
            Action::StartNow { .. } => "start",
            Action::StartDelayed { .. } => "start-delayed",
            Action::Restart { .. } => "restart",
            Action::AdvanceTimeout { debounce: false } => "next",
            Action::AdvanceTimeout { debounce: true } => "advance",
        }
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    /// Parses the names used by the HTTP entry points. Delayed starts carry
    /// a delay and are not addressable by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop" => Ok(Action::Stop),
            "toggle" => Ok(Action::Toggle),
            "start" => Ok(Action::start()),
            "restart" => Ok(Action::Restart { timeout: None }),
            "next" => Ok(Action::AdvanceTimeout { debounce: false }),
            "advance" => Ok(Action::AdvanceTimeout { debounce: true }),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Outcome of an advance-timeout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceStep {
    Stop,
    StartNow(Timeout),
    /// Start after the debounce window so further taps can still land.
    StartDelayed(Timeout),
}

/// Decide what an advance-timeout request does.
///
/// | catalog | state | debounce | condition | step |
/// |---------|-------|----------|-----------|------|
/// | single | stopped | any | | `StartNow(first)` |
/// | single | running | any | | `Stop` |
/// | many | stopped | any | | `StartDelayed(selection)` |
/// | many | running | false | | `StartNow(next)` |
/// | many | running | true | counting down | `Stop` |
/// | many | running | true | selection is last | `Stop` |
/// | many | running | true | otherwise | `StartDelayed(next)` |
pub fn plan_advance(state: &SessionState, catalog: &TimeoutCatalog, debounce: bool) -> AdvanceStep {
    let selection = catalog.selection();

    match (catalog.is_single(), state, debounce) {
        (true, SessionState::Stopped, _) => AdvanceStep::StartNow(catalog.first()),
        (true, SessionState::Running(_), _) => AdvanceStep::Stop,
        (false, SessionState::Stopped, _) => AdvanceStep::StartDelayed(selection),
        (false, SessionState::Running(_), false) => AdvanceStep::StartNow(catalog.next(selection)),
        (false, SessionState::Running(session), true) if session.is_counting_down() => AdvanceStep::Stop,
        (false, SessionState::Running(_), true) if catalog.wraps_after(selection) => AdvanceStep::Stop,
        (false, SessionState::Running(_), true) => AdvanceStep::StartDelayed(catalog.next(selection)),
    }
}
