//! Application directory paths for the desktop updater.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/desktop-updater/` | `~/.local/share/desktop-updater/` |
//! | Config | `~/Library/Application Support/desktop-updater/` | `~/.config/desktop-updater/` |
//!
//! # Environment Overrides
//!
//! - `DESKTOP_UPDATER_DATA_DIR` overrides [`data_dir`]
//! - `DESKTOP_UPDATER_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

const APP_DIR_NAME: &str = "desktop-updater";

/// Application data root directory. Holds logs.
///
/// Resolves to `dirs::data_dir()/desktop-updater/` by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("DESKTOP_UPDATER_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join("desktop-updater-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/desktop-updater/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("DESKTOP_UPDATER_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join("desktop-updater-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where gathered log archives are written: the user's desktop, falling
/// back to the home directory and then the data directory.
#[must_use]
pub fn log_bundle_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(data_dir)
}
