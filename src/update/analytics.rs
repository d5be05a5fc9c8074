//! Lifecycle analytics: named events and the stats they bump.
//!
//! Each lifecycle transition produces at most one [`AnalyticsRecord`]. A
//! record names the event and carries the stat pairs a stats backend
//! should bump for it. The download event fans out to several stats in one
//! record.

use serde::{Deserialize, Serialize};

use super::channel::UpdateChannel;
use crate::error::Result;

/// Default prefix for stat groups.
pub const DEFAULT_GROUP_PREFIX: &str = "desktop";

/// Named lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalyticsEvent {
    #[serde(rename = "update-check:needs-update")]
    NeedsUpdate,
    #[serde(rename = "update-check:no-update")]
    NoUpdate,
    #[serde(rename = "update-download")]
    Downloaded,
    #[serde(rename = "update:confirm")]
    Confirm,
    #[serde(rename = "update:cancel")]
    Cancel,
    #[serde(rename = "update:error")]
    Error,
}

impl AnalyticsEvent {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NeedsUpdate => "update-check:needs-update",
            Self::NoUpdate => "update-check:no-update",
            Self::Downloaded => "update-download",
            Self::Confirm => "update:confirm",
            Self::Cancel => "update:cancel",
            Self::Error => "update:error",
        }
    }
}

/// One counter bump: `group` is the stat, `name` the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub group: String,
    pub name: String,
}

impl Stat {
    fn new(group: String, name: impl Into<String>) -> Self {
        Self {
            group,
            name: name.into(),
        }
    }
}

/// Tags attached to every stat, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatTags {
    group_prefix: String,
    platform: String,
    version: String,
    beta: bool,
}

impl StatTags {
    #[must_use]
    pub fn new(
        group_prefix: impl Into<String>,
        platform: impl Into<String>,
        app_version: &str,
        channel: UpdateChannel,
    ) -> Self {
        Self {
            group_prefix: group_prefix.into(),
            platform: platform.into(),
            version: sanitize_version(app_version),
            beta: channel.is_beta(),
        }
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// `{platform}{-b when beta}-{version}`, e.g. `osx-b-10-2-0`.
    #[must_use]
    pub fn stats_string(&self) -> String {
        let suffix = if self.beta { "-b" } else { "" };
        format!("{}{suffix}-{}", self.platform, self.version)
    }

    fn group(&self, name: &str) -> String {
        format!("{}-{name}", self.group_prefix)
    }
}

/// An event plus the stats it expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRecord {
    pub event: AnalyticsEvent,
    pub stats: Vec<Stat>,
}

impl AnalyticsRecord {
    #[must_use]
    pub fn build(event: AnalyticsEvent, tags: &StatTags) -> Self {
        let s = tags.stats_string();
        let platform = tags.platform();
        let stats = match event {
            AnalyticsEvent::NeedsUpdate => vec![Stat::new(
                tags.group("update-check"),
                format!("{s}-needs-update"),
            )],
            AnalyticsEvent::NoUpdate => vec![Stat::new(
                tags.group("update-check"),
                format!("{s}-no-update"),
            )],
            AnalyticsEvent::Downloaded => vec![
                Stat::new(tags.group("download"), format!("{platform}-app")),
                Stat::new(
                    tags.group("download-by-ver"),
                    format!("{platform}-app-{}", tags.version()),
                ),
                Stat::new(tags.group("download-ref"), format!("update-{platform}-app")),
                Stat::new(tags.group("download-ref-only"), "update"),
            ],
            AnalyticsEvent::Confirm => {
                vec![Stat::new(tags.group("update"), format!("{s}-confirm"))]
            }
            AnalyticsEvent::Cancel => {
                vec![Stat::new(tags.group("update"), format!("{s}-update-cancel"))]
            }
            AnalyticsEvent::Error => {
                vec![Stat::new(tags.group("update"), format!("{s}-update-error"))]
            }
        };
        Self { event, stats }
    }
}

/// Sink for lifecycle records.
///
/// Delivery is fire-and-forget: the lifecycle logs an `Err` and carries on.
pub trait AnalyticsReporter: Send + Sync + 'static {
    fn record(&self, record: &AnalyticsRecord) -> Result<()>;
}

/// Reporter that only writes records to the log.
#[derive(Debug, Default)]
pub struct LogReporter;

impl AnalyticsReporter for LogReporter {
    fn record(&self, record: &AnalyticsRecord) -> Result<()> {
        for stat in &record.stats {
            tracing::info!(
                target: "desktop::analytics",
                event = record.event.name(),
                group = %stat.group,
                "bump stat {}",
                stat.name
            );
        }
        Ok(())
    }
}

/// Map an OS name (as in `std::env::consts::OS`) to its stats platform.
#[must_use]
pub fn stats_platform(os: &str) -> &str {
    match os {
        "macos" | "darwin" => "osx",
        "windows" | "win32" => "windows",
        "linux" => "linux",
        other => other,
    }
}

/// Stats platform for the running build.
#[must_use]
pub fn current_platform() -> &'static str {
    stats_platform(std::env::consts::OS)
}

/// Make a version string safe for stat names (`10.2.0` → `10-2-0`).
#[must_use]
pub fn sanitize_version(version: &str) -> String {
    version.trim().replace('.', "-")
}
