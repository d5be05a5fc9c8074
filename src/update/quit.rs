//! Install-and-quit coordination.
//!
//! Quitting naively lets the application's "all windows closed → quit"
//! listener race the installer's own quit request, which can abort the
//! install. The coordinator therefore disarms exit guards before it closes
//! anything, and only then hands over to the transport.
//!
//! The sequence runs at most once per process and cannot be aborted. A
//! failing step skips the remaining install steps but the process is still
//! terminated: windows may already be gone, so there is nothing safe to
//! return to.

use super::transport::UpdateTransport;
use crate::error::Result;

/// Process-local window handle.
pub type WindowId = u64;

/// Application context the coordinator drives.
pub trait ApplicationHost: Send + Sync + 'static {
    /// Remove quit vetoes and the "all windows closed" listener.
    fn disarm_exit_guards(&self) -> Result<()>;

    /// Open top-level windows, in process-local order.
    fn open_windows(&self) -> Vec<WindowId>;

    /// Close one window synchronously.
    fn close_window(&self, id: WindowId) -> Result<()>;

    /// Terminate the process. Production hosts do not return from this.
    fn exit(&self);
}

/// Steps of the quit sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitStep {
    DisarmExitGuards,
    CloseWindows,
    SetAutoInstall,
    InstallAndQuit,
}

impl QuitStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DisarmExitGuards => "disarm exit guards",
            Self::CloseWindows => "close windows",
            Self::SetAutoInstall => "set auto-install-on-quit",
            Self::InstallAndQuit => "install and quit",
        }
    }
}

impl std::fmt::Display for QuitStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quit sequence failure.
#[derive(Debug, thiserror::Error)]
pub enum QuitError {
    #[error("quit sequence already started")]
    AlreadyStarted,

    #[error("{step} failed: {message}")]
    Step { step: QuitStep, message: String },
}

/// Runs the install-and-quit sequence against an [`ApplicationHost`].
pub struct QuitCoordinator {
    host: Box<dyn ApplicationHost>,
    started: bool,
}

impl QuitCoordinator {
    #[must_use]
    pub fn new(host: Box<dyn ApplicationHost>) -> Self {
        Self {
            host,
            started: false,
        }
    }

    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Run the sequence, then request process exit.
    ///
    /// # Errors
    ///
    /// Returns [`QuitError::AlreadyStarted`] on a second call (the host is
    /// not touched), or the first failing step. In the failing case the
    /// process exit has already been requested.
    pub fn execute(&mut self, transport: &dyn UpdateTransport) -> std::result::Result<(), QuitError> {
        if self.started {
            return Err(QuitError::AlreadyStarted);
        }
        self.started = true;

        let outcome = self.install(transport);
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "quit sequence failed; terminating without install");
        }

        // Only reached when the transport did not end the process itself.
        tracing::info!("requesting process exit");
        self.host.exit();
        outcome
    }

    fn install(&self, transport: &dyn UpdateTransport) -> std::result::Result<(), QuitError> {
        self.host
            .disarm_exit_guards()
            .map_err(|e| step_error(QuitStep::DisarmExitGuards, e))?;

        let windows = self.host.open_windows();
        tracing::debug!(count = windows.len(), "closing windows before install");
        for id in windows {
            self.host
                .close_window(id)
                .map_err(|e| step_error(QuitStep::CloseWindows, e))?;
        }

        transport
            .set_auto_install_on_quit(true)
            .map_err(|e| step_error(QuitStep::SetAutoInstall, e))?;

        tracing::info!("handing over to transport for install");
        transport
            .install_and_quit()
            .map_err(|e| step_error(QuitStep::InstallAndQuit, e))
    }
}

fn step_error(step: QuitStep, e: crate::error::UpdaterError) -> QuitError {
    QuitError::Step {
        step,
        message: e.to_string(),
    }
}
