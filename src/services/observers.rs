//! Built-in status observers

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::settings::{Settings, SettingsStore};
use crate::state::{SessionState, SessionStatus, StatusObserver, Timeout};

/// Logs every transition.
#[derive(Debug, Default)]
pub struct LogObserver;

impl StatusObserver for LogObserver {
    fn on_status_changed(&self, status: &SessionStatus) {
        match &status.state {
            SessionState::Stopped => info!(selection = %status.selection, "Display may sleep"),
            SessionState::Running(session) if session.is_restarted() || session.is_indefinite() => {
                info!(
                    timeout = %session.start_timeout(),
                    "Keeping display awake"
                )
            }
            SessionState::Running(session) => {
                debug!(remaining = %session.remaining(), "Countdown")
            }
        }
    }
}

/// Publishes each status into a watch channel for readers outside the
/// session actor.
#[derive(Debug)]
pub struct WatchObserver {
    tx: watch::Sender<SessionStatus>,
}

impl WatchObserver {
    pub fn new(initial: SessionStatus) -> (Self, watch::Receiver<SessionStatus>) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, rx)
    }
}

impl StatusObserver for WatchObserver {
    fn on_status_changed(&self, status: &SessionStatus) {
        self.tx.send_replace(*status);
    }
}

/// Saves the selection and running flag whenever either of them changes.
pub struct SettingsObserver {
    store: Arc<dyn SettingsStore>,
    timeouts: Vec<Timeout>,
    last_saved: Mutex<Option<(Timeout, bool)>>,
}

impl SettingsObserver {
    pub fn new(store: Arc<dyn SettingsStore>, timeouts: Vec<Timeout>) -> Self {
        Self {
            store,
            timeouts,
            last_saved: Mutex::new(None),
        }
    }
}

impl StatusObserver for SettingsObserver {
    fn on_status_changed(&self, status: &SessionStatus) {
        let key = (status.selection, status.state.is_running());
        let mut last_saved = self
            .last_saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Countdown ticks change neither field.
        if *last_saved == Some(key) {
            return;
        }

        let settings = Settings {
            timeouts: self.timeouts.clone(),
            selected: key.0,
            running: key.1,
        };

        match self.store.save(&settings) {
            Ok(()) => *last_saved = Some(key),
            Err(e) => warn!("Failed to persist settings: {}", e),
        }
    }
}
