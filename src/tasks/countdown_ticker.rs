//! Countdown ticker background task
//!
//! Each call to [`CountdownTicker::start`] spawns one run:
//!
//! ```text
//!          start(delay > 0)           delay elapsed
//!  Idle ─────────────────► Delaying ───────────────► Ticking
//!   │                         │                         │
//!   │ start(delay = 0)        │ stop()                  │ stop() / reached zero
//!   └─────────────────────────┼────────► Ticking        ▼
//!                             └─────────────────────► Cancelled
//! ```
//!
//! Ticks are scheduled against absolute deadlines on the monotonic clock,
//! so a slow consumer never pushes later ticks back. Each tick carries the
//! [`RunId`] of the run that produced it; consumers compare it with
//! [`CountdownTicker::is_current`] to discard ticks that were already in
//! flight when the run was stopped or replaced.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::state::Timeout;

/// Spacing between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one run of the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

/// One countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub run: RunId,
    pub remaining: Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerPhase {
    Idle,
    Delaying,
    Ticking,
    Cancelled,
}

struct ActiveRun {
    id: RunId,
    cancel: CancellationToken,
    phase: Arc<watch::Sender<TickerPhase>>,
}

/// Cancellable one-tick-per-second countdown.
///
/// Ticks are delivered on the receiver returned by [`new`](Self::new).
/// Starting and stopping require a tokio runtime.
pub struct CountdownTicker {
    tick_tx: mpsc::UnboundedSender<Tick>,
    next_run: u64,
    current: Option<ActiveRun>,
}

impl CountdownTicker {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let ticker = Self {
            tick_tx,
            next_run: 0,
            current: None,
        };
        (ticker, tick_rx)
    }

    /// Begin a new run, stopping any previous one first.
    ///
    /// The first tick reports `initial` after `start_delay`; each following
    /// tick is one second later and one second lower, down to and including
    /// zero. An indefinite run reports `Indefinite` every second until
    /// stopped.
    pub fn start(&mut self, initial: Timeout, start_delay: Duration) -> RunId {
        self.stop();

        let id = RunId(self.next_run);
        self.next_run += 1;

        let initial_phase = if start_delay.is_zero() {
            TickerPhase::Ticking
        } else {
            TickerPhase::Delaying
        };
        let (phase, _) = watch::channel(initial_phase);
        let phase = Arc::new(phase);
        let cancel = CancellationToken::new();

        debug!(?id, %initial, ?start_delay, "Starting countdown");
        tokio::spawn(run_countdown(
            id,
            initial,
            start_delay,
            self.tick_tx.clone(),
            cancel.clone(),
            Arc::clone(&phase),
        ));

        self.current = Some(ActiveRun { id, cancel, phase });
        id
    }

    /// Halt the current run. No-op when nothing is running.
    pub fn stop(&mut self) {
        if let Some(run) = self.current.take() {
            debug!(id = ?run.id, "Stopping countdown");
            run.cancel.cancel();
            run.phase.send_replace(TickerPhase::Cancelled);
        }
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current.as_ref().map(|run| run.id)
    }

    /// Whether `run` is the run currently allowed to deliver ticks.
    pub fn is_current(&self, run: RunId) -> bool {
        self.current_run() == Some(run)
    }

    /// Phase of the current run; `Idle` once stopped.
    pub fn phase(&self) -> TickerPhase {
        match &self.current {
            Some(run) => *run.phase.borrow(),
            None => TickerPhase::Idle,
        }
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_countdown(
    id: RunId,
    initial: Timeout,
    start_delay: Duration,
    tick_tx: mpsc::UnboundedSender<Tick>,
    cancel: CancellationToken,
    phase: Arc<watch::Sender<TickerPhase>>,
) {
    // Deadlines are start + n * TICK_INTERVAL; missed ticks burst to catch up
    // so every value is still reported once.
    let mut interval = time::interval_at(Instant::now() + start_delay, TICK_INTERVAL);
    let mut remaining = initial;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        phase.send_replace(TickerPhase::Ticking);
        trace!(?id, %remaining, "Tick");
        if tick_tx.send(Tick { run: id, remaining }).is_err() {
            break;
        }

        if remaining.is_zero() {
            break;
        }
        remaining = remaining.saturating_sub(TICK_INTERVAL);
    }

    phase.send_replace(TickerPhase::Cancelled);
    debug!(?id, "Countdown finished");
}
