//! Keep-alive resource management
//!
//! The session controller acquires the resource when a session starts and
//! releases it when the session stops. On Linux the resource is a
//! `systemd-inhibit` child process that holds an idle/sleep inhibitor lock
//! for as long as it lives.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::{error::KeepAliveError, state::Timeout};

/// Holds the platform resource that keeps the display awake.
pub trait KeepAlive: Send {
    /// Take (or re-take) the resource for a session of `timeout`.
    /// `dim` allows the display to dim while still preventing sleep.
    fn acquire(&mut self, timeout: Timeout, dim: bool) -> Result<(), KeepAliveError>;

    /// Give the resource back. Calling this without a held resource is a
    /// no-op.
    fn release(&mut self);
}

/// Keep-alive backed by a `systemd-inhibit` child process.
#[derive(Debug)]
pub struct SystemdInhibitor {
    program: String,
    who: String,
    child: Option<Child>,
}

impl SystemdInhibitor {
    pub fn new() -> Self {
        Self::with_program("systemd-inhibit")
    }

    /// Use a different inhibitor binary (same command line contract).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            who: env!("CARGO_PKG_NAME").to_string(),
            child: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.child.is_some()
    }

    fn inhibit_what(dim: bool) -> &'static str {
        if dim {
            "sleep"
        } else {
            "idle:sleep"
        }
    }
}

impl Default for SystemdInhibitor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeepAlive for SystemdInhibitor {
    fn acquire(&mut self, timeout: Timeout, dim: bool) -> Result<(), KeepAliveError> {
        // Re-acquiring replaces the held lock rather than stacking a second one.
        self.release();

        let what = Self::inhibit_what(dim);
        debug!("Spawning {} --what={}", self.program, what);

        let child = Command::new(&self.program)
            .arg(format!("--what={}", what))
            .arg(format!("--who={}", self.who))
            .arg(format!("--why=Keeping the display awake ({})", timeout))
            .arg("--mode=block")
            .args(["sleep", "infinity"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(KeepAliveError::Spawn)?;

        info!(pid = ?child.id(), %timeout, dim, "Keep-alive inhibitor acquired");
        self.child = Some(child);
        Ok(())
    }

    fn release(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Err(e) = child.start_kill() {
            // Already exited; nothing left to release.
            warn!("Failed to kill keep-alive inhibitor: {}", e);
        } else {
            info!(pid = ?child.id(), "Keep-alive inhibitor released");
        }
    }
}

impl Drop for SystemdInhibitor {
    fn drop(&mut self) {
        self.release();
    }
}

/// Keep-alive that only logs; used with `--dry-run`.
#[derive(Debug, Default)]
pub struct DryRunKeepAlive {
    held: bool,
}

impl DryRunKeepAlive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeepAlive for DryRunKeepAlive {
    fn acquire(&mut self, timeout: Timeout, dim: bool) -> Result<(), KeepAliveError> {
        info!(%timeout, dim, "Dry run: would keep the display awake");
        self.held = true;
        Ok(())
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.held) {
            info!("Dry run: would release the display");
        }
    }
}

/// Check that the inhibitor binary is available on this system
pub async fn check_inhibit_available() -> Result<(), KeepAliveError> {
    let output = Command::new("systemd-inhibit")
        .arg("--version")
        .output()
        .await
        .map_err(|e| KeepAliveError::Unavailable(format!("systemd-inhibit not found: {}", e)))?;

    if !output.status.success() {
        return Err(KeepAliveError::Unavailable(
            "systemd-inhibit --version failed".to_string(),
        ));
    }

    debug!("systemd-inhibit is available");
    Ok(())
}
