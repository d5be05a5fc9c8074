//! JSON-over-stdio bridge between the updater and a native host shell.
//!
//! The shell owns the real update transport, the dialogs, and the windows.
//! This module supplies collaborator implementations that turn every
//! lifecycle request into an [`Outbound`](contract::Outbound) line, while
//! the shell's callbacks come back as [`Inbound`](contract::Inbound) lines.

pub mod contract;
pub mod stdio;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use self::contract::Outbound;
use crate::error::{Result, UpdaterError};
use crate::update::analytics::{AnalyticsRecord, AnalyticsReporter, LogReporter};
use crate::update::channel::ChannelPolicy;
use crate::update::notifier::Notifier;
use crate::update::quit::{ApplicationHost, WindowId};
use crate::update::session::ReleaseInfo;
use crate::update::transport::{TransportConfig, UpdateTransport};

/// Sender half of the outbound line queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    /// Queue a message for the writer task.
    ///
    /// # Errors
    ///
    /// Fails once the writer has stopped.
    pub fn send(&self, message: Outbound) -> Result<()> {
        let kind = message.kind();
        self.tx
            .send(message)
            .map_err(|_| UpdaterError::Channel(format!("bridge writer closed; {kind} dropped")))
    }
}

/// Windows the shell reported as open, in id order.
#[derive(Debug, Clone, Default)]
pub struct WindowRegistry {
    inner: Arc<Mutex<BTreeSet<WindowId>>>,
}

impl WindowRegistry {
    pub fn opened(&self, id: WindowId) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).insert(id);
    }

    pub fn closed(&self, id: WindowId) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).remove(&id);
    }

    #[must_use]
    pub fn ids(&self) -> Vec<WindowId> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }
}

/// Forwards transport requests to the shell.
pub struct BridgeTransport {
    out: Outbox,
}

impl BridgeTransport {
    #[must_use]
    pub fn new(out: Outbox) -> Self {
        Self { out }
    }
}

impl UpdateTransport for BridgeTransport {
    fn configure(&self, config: &TransportConfig) -> Result<()> {
        self.out.send(Outbound::TransportConfigure { config: *config })
    }

    fn check_for_updates(&self, policy: &ChannelPolicy) -> Result<()> {
        self.out.send(Outbound::TransportCheck {
            channel: policy.channel,
            allow_prerelease: policy.allow_prerelease,
        })
    }

    fn download(&self) -> Result<()> {
        self.out.send(Outbound::TransportDownload)
    }

    fn set_auto_install_on_quit(&self, enabled: bool) -> Result<()> {
        self.out
            .send(Outbound::TransportSetAutoInstallOnQuit { enabled })
    }

    fn install_and_quit(&self) -> Result<()> {
        self.out.send(Outbound::TransportInstallAndQuit)
    }
}

/// Asks the shell to show prompts.
pub struct BridgeNotifier {
    out: Outbox,
}

impl BridgeNotifier {
    #[must_use]
    pub fn new(out: Outbox) -> Self {
        Self { out }
    }
}

impl Notifier for BridgeNotifier {
    fn present_confirm_cancel(&self, release: &ReleaseInfo) -> Result<()> {
        self.out.send(Outbound::NotifierConfirmCancel {
            version: release.version.clone(),
        })
    }

    fn debug_message(&self, message: &str) -> Result<()> {
        self.out.send(Outbound::NotifierDebug {
            message: message.to_owned(),
        })
    }
}

/// Logs each record and hands its stats to the shell for delivery.
pub struct BridgeAnalytics {
    out: Outbox,
}

impl BridgeAnalytics {
    #[must_use]
    pub fn new(out: Outbox) -> Self {
        Self { out }
    }
}

impl AnalyticsReporter for BridgeAnalytics {
    fn record(&self, record: &AnalyticsRecord) -> Result<()> {
        LogReporter.record(record)?;
        self.out.send(Outbound::from(record))
    }
}

/// Application context backed by the shell's window list.
pub struct BridgeHost {
    out: Outbox,
    windows: WindowRegistry,
}

impl BridgeHost {
    #[must_use]
    pub fn new(out: Outbox, windows: WindowRegistry) -> Self {
        Self { out, windows }
    }
}

impl ApplicationHost for BridgeHost {
    fn disarm_exit_guards(&self) -> Result<()> {
        self.out.send(Outbound::HostDisarmExitGuards)
    }

    fn open_windows(&self) -> Vec<WindowId> {
        self.windows.ids()
    }

    fn close_window(&self, id: WindowId) -> Result<()> {
        self.out.send(Outbound::WindowClose { id })?;
        self.windows.closed(id);
        Ok(())
    }

    fn exit(&self) {
        if let Err(e) = self.out.send(Outbound::HostExit) {
            tracing::error!(error = %e, "could not signal host exit");
        }
    }
}
