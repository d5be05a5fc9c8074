//! Error types for the desktop updater.

/// Top-level error type for the update lifecycle and its plumbing.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// Update transport rejected a request (check, download, install).
    #[error("transport error: {0}")]
    Transport(String),

    /// Notifier could not present the confirm/cancel decision.
    #[error("notifier error: {0}")]
    Notifier(String),

    /// Analytics reporter failure. Never affects lifecycle transitions.
    #[error("analytics error: {0}")]
    Analytics(String),

    /// Application host failure (window registry, exit guards).
    #[error("host error: {0}")]
    Host(String),

    /// Quit coordination failure.
    #[error("quit error: {0}")]
    Quit(#[from] crate::update::quit::QuitError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Log setup or log archive error.
    #[error("diagnostics error: {0}")]
    Diagnostics(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdaterError>;
