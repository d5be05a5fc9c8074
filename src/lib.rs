//! Desktop updater: update lifecycle management for a desktop client.
//!
//! The crate decides the release channel once at startup and drives a single
//! update session through one state machine:
//! check → available → download → confirm → install-and-quit
//!
//! # Architecture
//!
//! - **Channel policy**: stable or beta, with matching prerelease/downgrade rules
//! - **Lifecycle**: the state machine, fed by one async event queue
//! - **Quit coordinator**: disarms exit guards and closes windows before installing
//! - **Analytics**: named lifecycle events expanded to stats
//! - **Bridge**: newline-delimited JSON link to the native shell that owns
//!   the real transport, dialogs, and windows

pub mod app_dirs;
pub mod bridge;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod update;

#[cfg(test)]
mod test_utils;

pub use config::UpdaterConfig;
pub use error::{Result, UpdaterError};
pub use update::{
    ChannelPolicy, LifecycleState, UpdateChannel, UpdateLifecycle, UpdaterHandle, UpdaterService,
};
