//! Capability interface for whatever actually talks to the release server.
//!
//! Transports never call into the state machine directly. They report back
//! by sending [`TransportEvent`]s through an
//! [`UpdaterHandle`](crate::update::service::UpdaterHandle), which keeps all
//! transitions on the updater's single event queue.

use serde::{Deserialize, Serialize};

use super::channel::{ChannelPolicy, UpdateChannel};
use super::session::{ErrorDetail, ReleaseInfo};
use crate::error::Result;

/// Settings applied to the transport once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub channel: UpdateChannel,
    pub allow_prerelease: bool,
    pub allow_downgrade: bool,
    /// Always `false` at construction: the quit coordinator owns the quit.
    pub auto_install_on_quit: bool,
}

impl From<&ChannelPolicy> for TransportConfig {
    fn from(policy: &ChannelPolicy) -> Self {
        Self {
            channel: policy.channel,
            allow_prerelease: policy.allow_prerelease,
            allow_downgrade: policy.allow_downgrade,
            auto_install_on_quit: false,
        }
    }
}

/// Requests the lifecycle issues to the transport.
///
/// Every method hands work off and returns immediately. An `Err` means the
/// request was rejected outright; asynchronous failures arrive later as
/// [`TransportEvent::Error`].
pub trait UpdateTransport: Send + Sync + 'static {
    fn configure(&self, config: &TransportConfig) -> Result<()>;

    fn check_for_updates(&self, policy: &ChannelPolicy) -> Result<()>;

    /// Begin downloading the release announced by the last `Available`.
    ///
    /// Transports that download on their own after a positive check can
    /// keep the default.
    fn download(&self) -> Result<()> {
        Ok(())
    }

    fn set_auto_install_on_quit(&self, enabled: bool) -> Result<()>;

    /// Install the downloaded artifact and end the process image.
    fn install_and_quit(&self) -> Result<()>;
}

/// Callback events from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Error(ErrorDetail),
    Available(ReleaseInfo),
    NotAvailable,
    Downloaded(ReleaseInfo),
}

impl TransportEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Available(_) => "update-available",
            Self::NotAvailable => "update-not-available",
            Self::Downloaded(_) => "update-downloaded",
        }
    }
}
