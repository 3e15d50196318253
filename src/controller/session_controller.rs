//! Session state machine

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::actions::{plan_advance, Action, AdvanceStep};
use crate::{
    error::{ControllerError, KeepAliveError},
    services::{KeepAlive, Settings},
    state::{SessionState, SessionStatus, SessionStore, Timeout},
    tasks::{CountdownTicker, RunId, Tick},
};

/// Default delay before a restart or debounced advance takes effect.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Let the display dim while the session keeps the system awake.
    pub dim: bool,
    pub debounce_window: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            dim: false,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// Applies actions and ticks to the session.
///
/// Every method must be called from one sequencing context (see
/// [`SessionHandle`](super::SessionHandle)); the controller itself never
/// blocks.
pub struct SessionController {
    store: SessionStore,
    ticker: CountdownTicker,
    keep_alive: Box<dyn KeepAlive>,
    options: ControllerOptions,
}

impl SessionController {
    pub fn new(
        store: SessionStore,
        ticker: CountdownTicker,
        keep_alive: Box<dyn KeepAlive>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            store,
            ticker,
            keep_alive,
            options,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn status(&self) -> SessionStatus {
        self.store.status()
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// Run whose ticks are currently accepted.
    pub fn current_run(&self) -> Option<RunId> {
        self.ticker.current_run()
    }

    /// Bring back the selection and running flag from a previous process.
    pub fn restore(&mut self, settings: &Settings) -> Result<SessionStatus, ControllerError> {
        let selected = if self.store.catalog().contains(settings.selected) {
            self.store.select(settings.selected)
        } else {
            warn!(saved = %settings.selected, "Saved timeout is not in the catalog");
            self.store.selection()
        };
        info!(%selected, running = settings.running, "Restoring saved session settings");

        if settings.running {
            self.apply(Action::start_with(selected))
        } else {
            Ok(self.status())
        }
    }

    pub fn apply(&mut self, action: Action) -> Result<SessionStatus, ControllerError> {
        debug!(?action, state = ?self.store.current(), "Applying action");

        match action {
            Action::Stop => self.stop(),
            Action::Toggle => {
                if self.store.current().is_running() {
                    self.stop();
                } else {
                    self.start(None, Duration::ZERO)?;
                }
            }
            Action::StartNow { timeout } => self.start(timeout, Duration::ZERO)?,
            Action::StartDelayed { timeout, delay } => self.start(timeout, delay)?,
            Action::Restart { timeout } => self.start(timeout, self.options.debounce_window)?,
            Action::AdvanceTimeout { debounce } => self.advance(debounce)?,
        }

        Ok(self.status())
    }

    /// Apply one countdown tick.
    ///
    /// Ticks from a run other than the current one are discarded, as are
    /// ticks that would move a just-restarted session backwards.
    pub fn on_tick(&mut self, tick: Tick) {
        if !self.ticker.is_current(tick.run) {
            trace!(?tick, "Discarding tick from stale run");
            return;
        }

        let SessionState::Running(session) = self.store.current() else {
            trace!(?tick, "Discarding tick while stopped");
            return;
        };

        if tick.remaining.is_zero() {
            info!(timeout = %session.start_timeout(), "Session timed out");
            self.stop();
            return;
        }

        if tick.remaining == session.remaining() {
            return;
        }

        if tick.remaining < session.remaining() || !session.is_restarted() {
            self.store
                .replace(SessionState::Running(session.with_remaining(tick.remaining)));
        } else {
            trace!(?tick, "Discarding tick that would undo a restart");
        }
    }

    /// Stop ticking and give the resource back without recording a stop,
    /// so a saved running flag survives for the next process.
    pub fn shutdown(&mut self) {
        info!("Shutting down session controller");
        self.ticker.stop();
        self.keep_alive.release();
    }

    fn stop(&mut self) {
        self.store.replace(SessionState::Stopped);
        self.ticker.stop();
        self.keep_alive.release();
    }

    fn start(&mut self, timeout: Option<Timeout>, delay: Duration) -> Result<(), ControllerError> {
        let timeout = timeout.unwrap_or_else(|| self.store.selection());

        if let Err(e) = self.acquire(timeout) {
            warn!("Falling back to stopped: {}", e);
            if self.store.current().is_running() {
                self.store.replace(SessionState::Stopped);
            }
            self.ticker.stop();
            self.keep_alive.release();
            return Err(e.into());
        }

        self.store.select(timeout);
        let running = SessionState::running(timeout);
        if self.store.current() == running {
            debug!(%timeout, "Session already at its start value");
        } else {
            self.store.replace(running);
        }
        self.ticker.start(timeout, delay);
        Ok(())
    }

    fn advance(&mut self, debounce: bool) -> Result<(), ControllerError> {
        let step = plan_advance(&self.store.current(), self.store.catalog(), debounce);
        debug!(?step, debounce, "Advancing timeout");

        match step {
            AdvanceStep::Stop => self.stop(),
            AdvanceStep::StartNow(timeout) => self.start(Some(timeout), Duration::ZERO)?,
            AdvanceStep::StartDelayed(timeout) => {
                self.start(Some(timeout), self.options.debounce_window)?
            }
        }
        Ok(())
    }

    // Retries once before giving up.
    fn acquire(&mut self, timeout: Timeout) -> Result<(), KeepAliveError> {
        let dim = self.options.dim;
        self.keep_alive.acquire(timeout, dim).or_else(|e| {
            warn!("Keep-alive acquire failed, retrying once: {}", e);
            self.keep_alive.acquire(timeout, dim)
        })
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.ticker.stop();
        self.keep_alive.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time;

    use super::*;
    use crate::{
        controller::testing::{KeepAliveEvent, RecordingKeepAlive},
        state::{StatusFanout, TimeoutCatalog},
        tasks::TickerPhase,
    };

    struct Harness {
        controller: SessionController,
        ticks: tokio::sync::mpsc::UnboundedReceiver<Tick>,
        keep_alive: RecordingKeepAlive,
        seen: Arc<Mutex<Vec<SessionStatus>>>,
    }

    fn harness_with(catalog: TimeoutCatalog) -> Harness {
        let fanout = StatusFanout::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        fanout.register(Arc::new(move |status: &SessionStatus| {
            sink.lock().unwrap().push(*status);
        }));

        let keep_alive = RecordingKeepAlive::new();
        let (ticker, ticks) = CountdownTicker::new();
        let controller = SessionController::new(
            SessionStore::new(catalog, fanout),
            ticker,
            Box::new(keep_alive.clone()),
            ControllerOptions::default(),
        );

        Harness {
            controller,
            ticks,
            keep_alive,
            seen,
        }
    }

    fn harness() -> Harness {
        harness_with(TimeoutCatalog::default())
    }

    impl Harness {
        fn tick(&mut self, secs: u64) {
            let run = self.controller.current_run().expect("ticker running");
            self.controller.on_tick(Tick {
                run,
                remaining: Timeout::from_secs(secs),
            });
        }

        fn running(&self) -> crate::state::RunningSession {
            *self
                .controller
                .store()
                .current()
                .as_running()
                .expect("session running")
        }

        fn notifications(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_now_selects_acquires_and_ticks() {
        let mut h = harness();
        let status = h.controller.apply(Action::start_with(Timeout::from_mins(10))).unwrap();

        assert_eq!(status.selection, Timeout::from_mins(10));
        assert_eq!(status.state, SessionState::running(Timeout::from_mins(10)));
        assert_eq!(
            h.keep_alive.events(),
            vec![KeepAliveEvent::Acquire(Timeout::from_mins(10), false)]
        );
        assert_eq!(h.controller.ticker.phase(), TickerPhase::Ticking);
        assert_eq!(h.notifications(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn bare_start_uses_current_selection() {
        let mut h = harness();
        let status = h.controller.apply(Action::start()).unwrap();
        assert_eq!(status.state, SessionState::running(Timeout::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn start_delayed_defers_countdown() {
        let mut h = harness();
        h.controller
            .apply(Action::StartDelayed {
                timeout: None,
                delay: Duration::from_secs(2),
            })
            .unwrap();
        assert_eq!(h.controller.ticker.phase(), TickerPhase::Delaying);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_always_resets_selection() {
        let starts = [
            None,
            Some(Action::start_with(Timeout::from_mins(30))),
            Some(Action::start_with(Timeout::Indefinite)),
        ];

        for start in starts {
            let mut h = harness();
            if let Some(action) = start {
                h.controller.apply(action).unwrap();
            }

            let status = h.controller.apply(Action::Stop).unwrap();

            assert_eq!(status.state, SessionState::Stopped);
            assert_eq!(status.selection, h.controller.store().catalog().first());
            assert_eq!(h.controller.current_run(), None);
            assert_eq!(h.keep_alive.events().last(), Some(&KeepAliveEvent::Release));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restart_is_transient() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_secs(30))).unwrap();
        h.tick(29);
        h.tick(28);
        assert!(!h.running().is_restarted());

        h.controller.apply(Action::Restart { timeout: None }).unwrap();
        assert!(h.running().is_restarted());
        assert_eq!(h.running().remaining(), Timeout::from_secs(30));

        // First tick of the new run reports the start value and changes nothing.
        h.tick(30);
        assert!(h.running().is_restarted());

        h.tick(29);
        assert!(!h.running().is_restarted());
        assert_eq!(h.running().previous_remaining(), Some(Timeout::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_tick_cannot_undo_restart() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_secs(30))).unwrap();
        let old_run = h.controller.current_run().unwrap();
        h.tick(20);

        h.controller.apply(Action::Restart { timeout: None }).unwrap();
        h.controller.on_tick(Tick {
            run: old_run,
            remaining: Timeout::from_secs(19),
        });

        assert_eq!(h.running().remaining(), Timeout::from_secs(30));
        assert!(h.running().is_restarted());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tick_stops() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_mins(5))).unwrap();
        h.tick(299);
        h.tick(0);

        assert_eq!(h.controller.store().current(), SessionState::Stopped);
        assert_eq!(h.controller.current_run(), None);
        assert_eq!(h.controller.ticker.phase(), TickerPhase::Idle);
        assert_eq!(h.keep_alive.events().last(), Some(&KeepAliveEvent::Release));
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_stop() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_secs(3))).unwrap();
        let run = h.controller.current_run().unwrap();
        h.tick(2);
        assert_eq!(h.running().remaining(), Timeout::from_secs(2));

        h.controller.apply(Action::Stop).unwrap();
        let notifications = h.notifications();
        h.controller.on_tick(Tick {
            run,
            remaining: Timeout::from_secs(1),
        });

        assert_eq!(h.controller.store().current(), SessionState::Stopped);
        assert_eq!(h.notifications(), notifications);
    }

    #[tokio::test(start_paused = true)]
    async fn indefinite_never_expires() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::Indefinite)).unwrap();
        let run = h.controller.current_run().unwrap();

        for _ in 0..1000 {
            h.controller.on_tick(Tick {
                run,
                remaining: Timeout::Indefinite,
            });
        }

        assert!(h.running().is_indefinite());
        assert_eq!(h.running().remaining(), Timeout::Indefinite);
        assert_eq!(h.notifications(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_advance_on_single_entry_catalog_stops() {
        let mut h = harness_with(TimeoutCatalog::new([Timeout::from_mins(5)]));
        h.controller.apply(Action::start()).unwrap();

        let status = h
            .controller
            .apply(Action::AdvanceTimeout { debounce: true })
            .unwrap();
        assert_eq!(status.state, SessionState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_advance_while_counting_down_stops() {
        let mut h = harness();
        h.controller.apply(Action::AdvanceTimeout { debounce: true }).unwrap();
        assert_eq!(h.controller.ticker.phase(), TickerPhase::Delaying);
        assert_eq!(h.running().start_timeout(), Timeout::from_secs(30));

        let status = h
            .controller
            .apply(Action::AdvanceTimeout { debounce: true })
            .unwrap();
        assert_eq!(status.state, SessionState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_advance_from_last_entry_ends_cycle() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::Indefinite)).unwrap();

        let status = h
            .controller
            .apply(Action::AdvanceTimeout { debounce: true })
            .unwrap();
        assert_eq!(status.state, SessionState::Stopped);
        assert_eq!(status.selection, Timeout::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn plain_advance_cycles_through_catalog() {
        let mut h = harness_with(TimeoutCatalog::new([
            Timeout::from_secs(30),
            Timeout::from_mins(5),
            Timeout::Indefinite,
        ]));
        h.controller.apply(Action::start()).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let status = h
                .controller
                .apply(Action::AdvanceTimeout { debounce: false })
                .unwrap();
            seen.push(status.selection);
            assert_eq!(h.controller.ticker.phase(), TickerPhase::Ticking);
        }

        assert_eq!(
            seen,
            vec![Timeout::from_mins(5), Timeout::Indefinite, Timeout::from_secs(30)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_starts_then_stops() {
        let mut h = harness();
        assert!(h.controller.apply(Action::Toggle).unwrap().state.is_running());
        assert!(h.controller.apply(Action::Toggle).unwrap().state.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_is_retried_once() {
        let mut h = harness();
        h.keep_alive.fail_next(1);

        let status = h.controller.apply(Action::start()).unwrap();
        assert!(status.state.is_running());
        assert_eq!(h.keep_alive.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_acquire_leaves_session_stopped() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_mins(5))).unwrap();
        h.keep_alive.fail_next(2);

        let err = h
            .controller
            .apply(Action::start_with(Timeout::from_mins(10)))
            .unwrap_err();

        assert!(matches!(err, ControllerError::KeepAlive(_)));
        assert_eq!(h.controller.store().current(), SessionState::Stopped);
        assert_eq!(h.controller.current_run(), None);
        assert_eq!(h.keep_alive.events().last(), Some(&KeepAliveEvent::Release));
        assert_eq!(
            h.seen.lock().unwrap().last().map(|s| s.state),
            Some(SessionState::Stopped)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_acquire_while_stopped_publishes_nothing() {
        let mut h = harness();
        h.keep_alive.fail_next(2);

        let err = h
            .controller
            .apply(Action::start_with(Timeout::from_mins(10)))
            .unwrap_err();

        assert!(matches!(err, ControllerError::KeepAlive(_)));
        assert_eq!(h.notifications(), 0);
        assert_eq!(h.controller.store().current(), SessionState::Stopped);
        assert_eq!(h.controller.status().selection, Timeout::from_secs(30));
        assert_eq!(h.controller.current_run(), None);
        assert_eq!(h.keep_alive.events(), vec![KeepAliveEvent::Release]);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_timeout_outside_catalog_is_honoured() {
        let mut h = harness();
        let status = h.controller.apply(Action::start_with(Timeout::from_secs(60))).unwrap();

        assert_eq!(status.state, SessionState::running(Timeout::from_secs(60)));
        assert_eq!(status.selection, Timeout::from_secs(60));
        assert_eq!(
            h.keep_alive.events(),
            vec![KeepAliveEvent::Acquire(Timeout::from_secs(60), false)]
        );

        h.tick(59);
        assert_eq!(h.running().remaining(), Timeout::from_secs(59));

        let status = h.controller.apply(Action::Stop).unwrap();
        assert_eq!(status.selection, Timeout::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_at_full_value_does_not_republish() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_mins(5))).unwrap();
        let first_run = h.controller.current_run();

        h.controller.apply(Action::Restart { timeout: None }).unwrap();

        assert_eq!(h.notifications(), 1);
        assert_ne!(h.controller.current_run(), first_run);
        assert_eq!(h.controller.ticker.phase(), TickerPhase::Delaying);
    }

    #[tokio::test(start_paused = true)]
    async fn one_notification_per_transition() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_secs(10))).unwrap();
        h.tick(10);
        h.tick(9);
        h.tick(8);
        h.controller.apply(Action::Stop).unwrap();

        let states: Vec<_> = h.seen.lock().unwrap().iter().map(|s| s.state).collect();
        assert_eq!(states.len(), 4);
        assert!(states[0].is_running());
        assert_eq!(
            states[2].as_running().map(|s| s.remaining()),
            Some(Timeout::from_secs(8))
        );
        assert_eq!(states[3], SessionState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_resumes_running_session() {
        let mut h = harness();
        let status = h
            .controller
            .restore(&Settings {
                timeouts: Vec::new(),
                selected: Timeout::from_mins(15),
                running: true,
            })
            .unwrap();

        assert_eq!(status.state, SessionState::running(Timeout::from_mins(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_stopped_only_selects() {
        let mut h = harness();
        let status = h
            .controller
            .restore(&Settings {
                timeouts: Vec::new(),
                selected: Timeout::from_mins(15),
                running: false,
            })
            .unwrap();

        assert_eq!(status.state, SessionState::Stopped);
        assert_eq!(status.selection, Timeout::from_mins(15));
        assert_eq!(h.notifications(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_ignores_timeout_outside_catalog() {
        let mut h = harness();
        let status = h
            .controller
            .restore(&Settings {
                timeouts: Vec::new(),
                selected: Timeout::from_secs(7),
                running: true,
            })
            .unwrap();

        assert_eq!(status.state, SessionState::running(Timeout::from_secs(30)));
        assert_eq!(status.selection, Timeout::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn real_ticker_expires_session() {
        let mut h = harness();
        h.controller.apply(Action::start_with(Timeout::from_secs(3))).unwrap();
        let started = time::Instant::now();

        while h.controller.store().current().is_running() {
            let tick = h.ticks.recv().await.unwrap();
            h.controller.on_tick(tick);
        }

        assert_eq!(time::Instant::now() - started, Duration::from_secs(3));
        // start, 2, 1, stop
        assert_eq!(h.notifications(), 4);
    }
}
