//! User-facing decision point for a downloaded update.

use serde::{Deserialize, Serialize};

use super::session::ReleaseInfo;
use crate::error::Result;

/// The user's answer to the confirm/cancel prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDecision {
    Confirm,
    Cancel,
}

/// Presents update prompts.
///
/// `present_confirm_cancel` must not block waiting for the user. The answer
/// is delivered later through
/// [`UpdaterHandle::decide`](crate::update::service::UpdaterHandle::decide).
pub trait Notifier: Send + Sync + 'static {
    fn present_confirm_cancel(&self, release: &ReleaseInfo) -> Result<()>;

    /// Surface a diagnostic message. Only called in updater test builds.
    fn debug_message(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}
