//! The single update session owned by the lifecycle state machine.
//!
//! A session lives for the whole process. It is never persisted: after a
//! completed, cancelled, or failed cycle it is reset to [`LifecycleState::Idle`].

use serde::{Deserialize, Serialize};

use super::channel::UpdateChannel;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Idle,
    Checking,
    Available,
    Downloading,
    Downloaded,
    Confirming,
    /// Terminal. The process exits from here.
    Installing,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Available => "available",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Confirming => "confirming",
            Self::Installing => "installing",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Installing)
    }

    /// Whether a session in this state must carry a [`ReleaseInfo`].
    #[must_use]
    pub fn holds_release(self) -> bool {
        matches!(
            self,
            Self::Available | Self::Downloading | Self::Downloaded | Self::Confirming
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered or downloaded release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub version: String,
}

impl ReleaseInfo {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

/// Stage of the update cycle an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStage {
    Check,
    Download,
    Notify,
    Install,
}

impl ErrorStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Download => "download",
            Self::Notify => "notify",
            Self::Install => "install",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "check" => Some(Self::Check),
            "download" => Some(Self::Download),
            "notify" => Some(Self::Notify),
            "install" => Some(Self::Install),
            _ => None,
        }
    }
}

/// Error payload reported by the transport (or raised while driving it).
///
/// Only used for logging and the `update:error` stat; never shown verbatim
/// to end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<ErrorStage>,
}

impl ErrorDetail {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stage: None,
        }
    }

    #[must_use]
    pub fn at(stage: ErrorStage, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stage: Some(stage),
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} failed: {}", stage.as_str(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Mutable session state. Only the lifecycle state machine holds one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSession {
    state: LifecycleState,
    release: Option<ReleaseInfo>,
    last_error: Option<ErrorDetail>,
}

impl UpdateSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn release(&self) -> Option<&ReleaseInfo> {
        self.release.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&ErrorDetail> {
        self.last_error.as_ref()
    }

    /// Move to `state`, keeping the current release.
    pub(crate) fn advance(&mut self, state: LifecycleState) {
        self.state = state;
    }

    /// Move to `state` and replace the release.
    pub(crate) fn advance_with(&mut self, state: LifecycleState, release: ReleaseInfo) {
        self.state = state;
        self.release = Some(release);
    }

    /// Move to `state`, handing the release to the caller.
    pub(crate) fn advance_taking(&mut self, state: LifecycleState) -> Option<ReleaseInfo> {
        self.state = state;
        self.release.take()
    }

    /// Back to idle, dropping the release.
    pub(crate) fn reset(&mut self) {
        self.state = LifecycleState::Idle;
        self.release = None;
    }

    pub(crate) fn record_error(&mut self, detail: ErrorDetail) {
        self.reset();
        self.last_error = Some(detail);
    }

    /// Copy the session for callers outside the state machine.
    #[must_use]
    pub fn snapshot(&self, channel: UpdateChannel) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            release: self.release.clone(),
            last_error: self.last_error.clone(),
            channel,
        }
    }
}

/// Read-only copy of the session handed out by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: LifecycleState,
    pub release: Option<ReleaseInfo>,
    pub last_error: Option<ErrorDetail>,
    pub channel: UpdateChannel,
}
