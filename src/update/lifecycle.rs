//! The update lifecycle state machine.
//!
//! ```text
//! Idle ──start_check──▶ Checking ──available──▶ Available ─(download)─▶ Downloading
//!   ▲                      │                                                │
//!   │◀────not_available────┘                                          downloaded
//!   │                                                                       ▼
//!   │◀──────────────cancel────────── Confirming ◀──(notify)─────────── Downloaded
//!   │                                   │
//!   │                                confirm
//!   │                                   ▼
//!   │                               Installing (terminal, quit coordinator runs)
//!   └◀── error (from any non-terminal state)
//! ```
//!
//! Every operation runs to completion and reports a [`Transition`]. Events
//! that are not valid for the current state are ignored without side
//! effects: callers may legitimately race the session, e.g. a stale
//! confirm button still on screen after an error reset it.

use super::analytics::{AnalyticsEvent, AnalyticsRecord, AnalyticsReporter, StatTags};
use super::channel::ChannelPolicy;
use super::notifier::{Notifier, UserDecision};
use super::quit::{ApplicationHost, QuitCoordinator};
use super::session::{
    ErrorDetail, ErrorStage, LifecycleState, ReleaseInfo, SessionSnapshot, UpdateSession,
};
use super::transport::{TransportConfig, TransportEvent, UpdateTransport};
use crate::error::Result;

/// Outcome of one lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied {
        from: LifecycleState,
        to: LifecycleState,
    },
    Ignored {
        state: LifecycleState,
    },
}

impl Transition {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// State after the operation.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match *self {
            Self::Applied { to, .. } => to,
            Self::Ignored { state } => state,
        }
    }
}

/// Fixed inputs besides the channel policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Stats platform identifier (`osx`, `windows`, `linux`).
    pub platform: String,
    /// Version of the running application.
    pub app_version: String,
    /// Prefix for stat groups.
    pub group_prefix: String,
    /// Also surface debug notices through the notifier (updater test builds).
    pub debug_dialogs: bool,
}

/// The external collaborators the lifecycle drives.
pub struct Collaborators {
    pub transport: Box<dyn UpdateTransport>,
    pub notifier: Box<dyn Notifier>,
    pub analytics: Box<dyn AnalyticsReporter>,
    pub host: Box<dyn ApplicationHost>,
}

/// Owns the update session and applies events to it.
pub struct UpdateLifecycle {
    policy: ChannelPolicy,
    session: UpdateSession,
    tags: StatTags,
    debug_dialogs: bool,
    transport: Box<dyn UpdateTransport>,
    notifier: Box<dyn Notifier>,
    analytics: Box<dyn AnalyticsReporter>,
    quit: QuitCoordinator,
}

impl UpdateLifecycle {
    /// Create the lifecycle and apply the channel configuration to the
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects its configuration.
    pub fn new(
        policy: ChannelPolicy,
        settings: LifecycleSettings,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let Collaborators {
            transport,
            notifier,
            analytics,
            host,
        } = collaborators;

        transport.configure(&TransportConfig::from(&policy))?;
        tracing::info!(
            channel = %policy.channel,
            allow_prerelease = policy.allow_prerelease,
            allow_downgrade = policy.allow_downgrade,
            "update transport configured"
        );

        Ok(Self {
            tags: StatTags::new(
                settings.group_prefix,
                settings.platform,
                &settings.app_version,
                policy.channel,
            ),
            policy,
            session: UpdateSession::new(),
            debug_dialogs: settings.debug_dialogs,
            transport,
            notifier,
            analytics,
            quit: QuitCoordinator::new(host),
        })
    }

    #[must_use]
    pub fn policy(&self) -> &ChannelPolicy {
        &self.policy
    }

    #[must_use]
    pub fn session(&self) -> &UpdateSession {
        &self.session
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.session.state()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(self.policy.channel)
    }

    /// Ask the transport for an update. Ignored unless idle.
    pub fn start_check(&mut self) -> Transition {
        let from = self.state();
        if from != LifecycleState::Idle {
            return self.ignore("start_check");
        }

        self.session.advance(LifecycleState::Checking);
        self.debug_notice("Checking for update");

        if let Err(e) = self.transport.check_for_updates(&self.policy) {
            return self.fail(from, ErrorDetail::at(ErrorStage::Check, e.to_string()));
        }
        self.applied(from)
    }

    /// A newer release exists. Records it and moves straight on to
    /// downloading.
    pub fn on_transport_available(&mut self, release: ReleaseInfo) -> Transition {
        let from = self.state();
        if from != LifecycleState::Checking {
            return self.ignore("available");
        }

        tracing::info!(version = %release.version, "new update is available");
        self.session.advance_with(LifecycleState::Available, release);

        // A rejected request makes this an error transition with its own stat.
        if let Err(e) = self.transport.download() {
            return self.fail(from, ErrorDetail::at(ErrorStage::Download, e.to_string()));
        }
        self.session.advance(LifecycleState::Downloading);
        self.emit(AnalyticsEvent::NeedsUpdate);
        self.applied(from)
    }

    pub fn on_transport_not_available(&mut self) -> Transition {
        let from = self.state();
        if from != LifecycleState::Checking {
            return self.ignore("not_available");
        }

        tracing::info!("no update is available");
        self.session.reset();
        self.emit(AnalyticsEvent::NoUpdate);
        self.applied(from)
    }

    /// The download finished. The downloaded version supersedes whatever
    /// `available` announced.
    pub fn on_transport_downloaded(&mut self, release: ReleaseInfo) -> Transition {
        let from = self.state();
        if from != LifecycleState::Downloading {
            return self.ignore("downloaded");
        }

        if let Some(announced) = self.session.release()
            && announced.version != release.version
        {
            tracing::warn!(
                announced = %announced.version,
                downloaded = %release.version,
                "downloaded version differs from announced version"
            );
        }
        tracing::info!(version = %release.version, "update downloaded");

        self.session
            .advance_with(LifecycleState::Downloaded, release.clone());

        if let Err(e) = self.notifier.present_confirm_cancel(&release) {
            return self.fail(from, ErrorDetail::at(ErrorStage::Notify, e.to_string()));
        }
        self.session.advance(LifecycleState::Confirming);
        self.emit(AnalyticsEvent::Downloaded);
        self.applied(from)
    }

    /// The user accepted the update: hand over to the quit coordinator.
    ///
    /// With a production host this does not return.
    pub fn on_user_confirm(&mut self) -> Transition {
        let from = self.state();
        if from != LifecycleState::Confirming {
            return self.ignore("confirm");
        }

        let release = self.session.advance_taking(LifecycleState::Installing);
        tracing::info!(
            version = release.as_ref().map(|r| r.version.as_str()).unwrap_or("unknown"),
            "update confirmed; installing"
        );
        self.emit(AnalyticsEvent::Confirm);

        // Failures are logged by the coordinator and still end the process.
        let _ = self.quit.execute(self.transport.as_ref());
        self.applied(from)
    }

    /// The user declined. The downloaded artifact is abandoned.
    pub fn on_user_cancel(&mut self) -> Transition {
        let from = self.state();
        if from != LifecycleState::Confirming {
            return self.ignore("cancel");
        }

        tracing::info!("update cancelled by user");
        self.session.reset();
        self.emit(AnalyticsEvent::Cancel);
        self.applied(from)
    }

    /// Universal recovery edge: any non-terminal state falls back to idle.
    pub fn on_transport_error(&mut self, detail: ErrorDetail) -> Transition {
        let from = self.state();
        if from.is_terminal() {
            return self.ignore("error");
        }
        self.fail(from, detail)
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Transition {
        match event {
            TransportEvent::Error(detail) => self.on_transport_error(detail),
            TransportEvent::Available(release) => self.on_transport_available(release),
            TransportEvent::NotAvailable => self.on_transport_not_available(),
            TransportEvent::Downloaded(release) => self.on_transport_downloaded(release),
        }
    }

    pub fn handle_decision(&mut self, decision: UserDecision) -> Transition {
        match decision {
            UserDecision::Confirm => self.on_user_confirm(),
            UserDecision::Cancel => self.on_user_cancel(),
        }
    }

    fn fail(&mut self, from: LifecycleState, detail: ErrorDetail) -> Transition {
        tracing::warn!(error = %detail, state = %self.state(), "update error");
        self.session.record_error(detail);
        self.emit(AnalyticsEvent::Error);
        self.applied(from)
    }

    fn applied(&self, from: LifecycleState) -> Transition {
        let to = self.state();
        tracing::debug!(%from, %to, "update transition");
        Transition::Applied { from, to }
    }

    fn ignore(&self, operation: &str) -> Transition {
        let state = self.state();
        tracing::debug!(operation, %state, "ignoring update event not valid in current state");
        Transition::Ignored { state }
    }

    fn emit(&self, event: AnalyticsEvent) {
        let record = AnalyticsRecord::build(event, &self.tags);
        if let Err(e) = self.analytics.record(&record) {
            tracing::warn!(event = event.name(), error = %e, "analytics record dropped");
        }
    }

    fn debug_notice(&self, message: &str) {
        tracing::debug!("{message}");
        if self.debug_dialogs
            && let Err(e) = self.notifier.debug_message(message)
        {
            tracing::debug!(error = %e, "debug notice not shown");
        }
    }
}
