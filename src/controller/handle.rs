//! Session actor: serialises actions and ticks on one task

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{actions::Action, session_controller::SessionController};
use crate::{
    error::ControllerError,
    services::WatchObserver,
    state::{SessionStatus, StatusFanout, Timeout},
    tasks::Tick,
};

const COMMAND_BUFFER: usize = 32;

enum Command {
    Apply {
        action: Action,
        reply: oneshot::Sender<Result<SessionStatus, ControllerError>>,
    },
}

/// Cloneable front end to the session actor.
///
/// The actor task owns the [`SessionController`] exclusively and handles
/// one action or tick at a time, so an action can never interleave with a
/// tick.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<SessionStatus>,
    fanout: StatusFanout,
    timeouts: Vec<Timeout>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Apply { action, .. } => f.debug_struct("Apply").field("action", action).finish(),
        }
    }
}

impl SessionHandle {
    /// Spawn the actor for `controller`, fed by the ticker's `ticks`.
    pub fn spawn(
        controller: SessionController,
        ticks: mpsc::UnboundedReceiver<Tick>,
    ) -> (Self, JoinHandle<()>) {
        let fanout = controller.store().fanout().clone();
        let timeouts = controller.store().catalog().entries().to_vec();

        let (observer, status) = WatchObserver::new(controller.status());
        fanout.register(std::sync::Arc::new(observer));

        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_session(controller, command_rx, ticks, cancel.clone()));

        let handle = Self {
            commands,
            status,
            fanout,
            timeouts,
            cancel,
        };
        (handle, task)
    }

    pub async fn apply(&self, action: Action) -> Result<SessionStatus, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Apply { action, reply })
            .await
            .map_err(|_| ControllerError::Closed)?;
        response.await.map_err(|_| ControllerError::Closed)?
    }

    /// Latest published status.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Registry for additional observers.
    pub fn fanout(&self) -> &StatusFanout {
        &self.fanout
    }

    pub fn timeouts(&self) -> &[Timeout] {
        &self.timeouts
    }

    /// Ask the actor to stop; the keep-alive resource is released.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn run_session(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<Command>,
    mut ticks: mpsc::UnboundedReceiver<Tick>,
    cancel: CancellationToken,
) {
    info!("Starting session controller task");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(Command::Apply { action, reply }) => {
                    let result = controller.apply(action);
                    if reply.send(result).is_err() {
                        debug!(?action, "Caller went away before the reply");
                    }
                }
                None => break,
            },
            Some(tick) = ticks.recv() => controller.on_tick(tick),
        }
    }

    controller.shutdown();
}
