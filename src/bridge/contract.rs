//! Newline-delimited JSON messages exchanged with the host shell.
//!
//! Every message is an object with a `type` field. Inbound messages carry
//! transport callbacks, user decisions, and window bookkeeping from the
//! shell; outbound messages are requests the updater makes of it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::update::analytics::{AnalyticsEvent, AnalyticsRecord, Stat};
use crate::update::channel::UpdateChannel;
use crate::update::notifier::UserDecision;
use crate::update::quit::WindowId;
use crate::update::session::{ErrorDetail, ErrorStage, ReleaseInfo, SessionSnapshot};
use crate::update::transport::{TransportConfig, TransportEvent};

/// Host shell -> updater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "update.check")]
    UpdateCheck,
    #[serde(rename = "transport.error")]
    TransportError {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
    },
    #[serde(rename = "transport.available")]
    TransportAvailable { version: String },
    #[serde(rename = "transport.not_available")]
    TransportNotAvailable,
    #[serde(rename = "transport.downloaded")]
    TransportDownloaded { version: String },
    #[serde(rename = "user.confirm")]
    UserConfirm,
    #[serde(rename = "user.cancel")]
    UserCancel,
    #[serde(rename = "window.opened")]
    WindowOpened { id: WindowId },
    #[serde(rename = "window.closed")]
    WindowClosed { id: WindowId },
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "logs.gather")]
    LogsGather,
}

impl Inbound {
    /// The transport event this message carries, if any.
    ///
    /// Unknown error stages are dropped rather than rejected.
    #[must_use]
    pub fn transport_event(&self) -> Option<TransportEvent> {
        match self {
            Self::TransportError { message, stage } => Some(TransportEvent::Error(ErrorDetail {
                message: message.clone(),
                stage: stage.as_deref().and_then(ErrorStage::parse),
            })),
            Self::TransportAvailable { version } => {
                Some(TransportEvent::Available(ReleaseInfo::new(version.as_str())))
            }
            Self::TransportNotAvailable => Some(TransportEvent::NotAvailable),
            Self::TransportDownloaded { version } => {
                Some(TransportEvent::Downloaded(ReleaseInfo::new(version.as_str())))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn decision(&self) -> Option<UserDecision> {
        match self {
            Self::UserConfirm => Some(UserDecision::Confirm),
            Self::UserCancel => Some(UserDecision::Cancel),
            _ => None,
        }
    }
}

/// Updater -> host shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outbound {
    #[serde(rename = "transport.configure")]
    TransportConfigure { config: TransportConfig },
    #[serde(rename = "transport.check")]
    TransportCheck {
        channel: UpdateChannel,
        allow_prerelease: bool,
    },
    #[serde(rename = "transport.download")]
    TransportDownload,
    #[serde(rename = "transport.set_auto_install_on_quit")]
    TransportSetAutoInstallOnQuit { enabled: bool },
    #[serde(rename = "transport.install_and_quit")]
    TransportInstallAndQuit,
    #[serde(rename = "notifier.confirm_cancel")]
    NotifierConfirmCancel { version: String },
    #[serde(rename = "notifier.debug")]
    NotifierDebug { message: String },
    #[serde(rename = "host.disarm_exit_guards")]
    HostDisarmExitGuards,
    #[serde(rename = "window.close")]
    WindowClose { id: WindowId },
    /// Last line the bridge writes. The process exits right after.
    #[serde(rename = "host.exit")]
    HostExit,
    #[serde(rename = "analytics.stats")]
    AnalyticsStats {
        event: AnalyticsEvent,
        stats: Vec<Stat>,
    },
    #[serde(rename = "status")]
    Status { session: SessionSnapshot },
    #[serde(rename = "logs.gathered")]
    LogsGathered { path: PathBuf },
    #[serde(rename = "error")]
    Error { message: String },
}

impl Outbound {
    /// Wire name of the message type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransportConfigure { .. } => "transport.configure",
            Self::TransportCheck { .. } => "transport.check",
            Self::TransportDownload => "transport.download",
            Self::TransportSetAutoInstallOnQuit { .. } => "transport.set_auto_install_on_quit",
            Self::TransportInstallAndQuit => "transport.install_and_quit",
            Self::NotifierConfirmCancel { .. } => "notifier.confirm_cancel",
            Self::NotifierDebug { .. } => "notifier.debug",
            Self::HostDisarmExitGuards => "host.disarm_exit_guards",
            Self::WindowClose { .. } => "window.close",
            Self::HostExit => "host.exit",
            Self::AnalyticsStats { .. } => "analytics.stats",
            Self::Status { .. } => "status",
            Self::LogsGathered { .. } => "logs.gathered",
            Self::Error { .. } => "error",
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<&AnalyticsRecord> for Outbound {
    fn from(record: &AnalyticsRecord) -> Self {
        Self::AnalyticsStats {
            event: record.event,
            stats: record.stats.clone(),
        }
    }
}
