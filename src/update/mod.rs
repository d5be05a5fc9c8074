//! Update lifecycle for the desktop client.
//!
//! Decides the release channel once at startup, drives a single update
//! session from check to install through [`lifecycle::UpdateLifecycle`],
//! and coordinates a clean install-and-quit. Every transition runs on one
//! event queue owned by [`service::UpdaterService`].

pub mod analytics;
pub mod channel;
pub mod lifecycle;
pub mod notifier;
pub mod pixel;
pub mod quit;
pub mod service;
pub mod session;
pub mod transport;

pub use analytics::{AnalyticsEvent, AnalyticsRecord, AnalyticsReporter, LogReporter, Stat};
pub use channel::{ChannelPolicy, UpdateChannel};
pub use lifecycle::{Collaborators, LifecycleSettings, Transition, UpdateLifecycle};
pub use notifier::{Notifier, UserDecision};
pub use pixel::PixelReporter;
pub use quit::{ApplicationHost, QuitCoordinator, QuitError, QuitStep, WindowId};
pub use service::{UpdaterHandle, UpdaterInbox, UpdaterService, spawn_poller, updater_channel};
pub use session::{ErrorDetail, ErrorStage, LifecycleState, ReleaseInfo, SessionSnapshot};
pub use transport::{TransportConfig, TransportEvent, UpdateTransport};
