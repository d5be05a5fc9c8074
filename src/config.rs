//! Configuration types for the desktop updater.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::update::analytics::{DEFAULT_GROUP_PREFIX, current_platform};
use crate::update::channel::ChannelPolicy;
use crate::update::lifecycle::LifecycleSettings;

/// Environment variable overriding the log file path.
pub const LOG_PATH_ENV: &str = "DESKTOP_UPDATER_LOG";

/// Environment variable overriding the log level filter.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Filter used when neither [`LOG_LEVEL_ENV`] nor `logging.level` is set:
/// everything from this crate, warnings and up from dependencies.
pub const DEFAULT_LOG_FILTER: &str = "desktop_updater=trace,desktop=trace,warn";

/// Environment variable that turns on console logging when set.
pub const DEBUG_ENV: &str = "DEBUG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Update channel and polling settings.
    pub update: UpdateConfig,
    /// Facts about the running application.
    pub app: AppConfig,
    /// Stats reporting settings.
    pub analytics: AnalyticsConfig,
    /// Log file settings.
    pub logging: LoggingConfig,
}

/// Kind of build the updater runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildKind {
    #[default]
    Release,
    /// Updater test build: debug notices are also shown to the user.
    Updater,
}

/// Update channel and polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Opt in to the beta channel.
    pub beta: bool,
    pub build: BuildKind,
    /// Delay before the first check after startup, in seconds.
    pub initial_delay_secs: u64,
    /// Interval between checks, in seconds. 0 disables polling.
    pub check_interval_secs: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            beta: false,
            build: BuildKind::Release,
            initial_delay_secs: 300,
            check_interval_secs: 6 * 60 * 60,
        }
    }
}

/// Running application facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version of the running application.
    pub version: String,
    /// Stats platform override (`osx`, `windows`, `linux`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            platform: None,
        }
    }
}

impl AppConfig {
    /// The configured platform, or the one detected for this build.
    #[must_use]
    pub fn effective_platform(&self) -> String {
        match self.platform.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_owned(),
            _ => current_platform().to_owned(),
        }
    }
}

/// Stats reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Stats pixel URL. `None` logs stats instead of sending them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Prefix for stat groups.
    pub group_prefix: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            group_prefix: DEFAULT_GROUP_PREFIX.to_owned(),
        }
    }
}

/// Log file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter directive (`info`, `desktop_updater=debug`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log file path. Defaults to `<data_dir>/logs/desktop-updater.log`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Mirror log lines to stderr.
    pub console: bool,
    /// Rotate once the active file would exceed this many bytes.
    pub max_size: u64,
    /// Number of log files kept, the active one included.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            path: None,
            console: false,
            max_size: 15_000_000,
            max_files: 3,
        }
    }
}

impl LoggingConfig {
    /// Log path after applying the [`LOG_PATH_ENV`] override.
    #[must_use]
    pub fn effective_path(&self) -> PathBuf {
        self.resolve_path(std::env::var_os(LOG_PATH_ENV))
    }

    fn resolve_path(&self, env_override: Option<OsString>) -> PathBuf {
        if let Some(p) = env_override.filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        self.path
            .clone()
            .unwrap_or_else(|| crate::app_dirs::logs_dir().join("desktop-updater.log"))
    }

    /// Filter directive after applying the [`LOG_LEVEL_ENV`] override.
    /// Falls back to [`DEFAULT_LOG_FILTER`].
    #[must_use]
    pub fn effective_level(&self) -> String {
        self.resolve_level(std::env::var(LOG_LEVEL_ENV).ok())
    }

    fn resolve_level(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|l| !l.trim().is_empty())
            .or_else(|| self.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
    }

    /// Whether console logging is on (config flag or [`DEBUG_ENV`] set).
    #[must_use]
    pub fn console_enabled(&self) -> bool {
        self.console || std::env::var_os(DEBUG_ENV).is_some_and(|v| !v.is_empty())
    }
}

impl UpdaterConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            crate::error::UpdaterError::Config(format!("{}: {e}", path.display()))
        })
    }

    /// Load `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> crate::error::Result<Self> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::UpdaterError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (`config_dir()/config.toml`).
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::app_dirs::config_file()
    }

    /// The channel policy for this process. Computed once at startup.
    #[must_use]
    pub fn channel_policy(&self) -> ChannelPolicy {
        ChannelPolicy::derive(self.update.beta)
    }

    #[must_use]
    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            platform: self.app.effective_platform(),
            app_version: self.app.version.clone(),
            group_prefix: self.analytics.group_prefix.clone(),
            debug_dialogs: self.update.build == BuildKind::Updater,
        }
    }
}
