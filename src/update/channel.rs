//! Release channel selection.
//!
//! The channel is derived once from the user's beta opt-in at startup and
//! never changes for the lifetime of the process.

use serde::{Deserialize, Serialize};

/// Release track the updater follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateChannel {
    /// Promoted releases only (default).
    #[default]
    Stable,
    /// Prereleases ahead of stable.
    Beta,
}

impl UpdateChannel {
    /// Render channel name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
        }
    }

    #[must_use]
    pub fn is_beta(self) -> bool {
        matches!(self, Self::Beta)
    }
}

impl std::fmt::Display for UpdateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel plus the release rules that come with it.
///
/// Stable accepts downgrades (so a user leaving beta lands back on the
/// stable build) but never prereleases. Beta accepts prereleases and never
/// downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPolicy {
    pub channel: UpdateChannel,
    pub allow_prerelease: bool,
    pub allow_downgrade: bool,
}

impl ChannelPolicy {
    /// Derive the policy for the given beta opt-in flag.
    #[must_use]
    pub fn derive(beta_opt_in: bool) -> Self {
        if beta_opt_in {
            Self {
                channel: UpdateChannel::Beta,
                allow_prerelease: true,
                allow_downgrade: false,
            }
        } else {
            Self {
                channel: UpdateChannel::Stable,
                allow_prerelease: false,
                allow_downgrade: true,
            }
        }
    }

    #[must_use]
    pub fn is_beta(&self) -> bool {
        self.channel.is_beta()
    }
}
