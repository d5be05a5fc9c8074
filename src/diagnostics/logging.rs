//! Process-wide `tracing` setup.
//!
//! Lines look like:
//! ```text
//! [2026-03-01 14:02:11.408] [desktop::updater::auto] [INFO] update available version="1.4.0"
//! ```

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use super::log_rotation::RotatingFileWriter;
use crate::config::LoggingConfig;
use crate::error::{Result, UpdaterError};

/// `[timestamp] [target] [level] message` event format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "[{}] [{}] [{}] ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber: rotating file output, plus stderr when
/// console logging is enabled.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the background log writer.
///
/// # Errors
///
/// Fails if the level filter is invalid, the log file cannot be opened, or
/// a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let level = config.effective_level();
    let filter = EnvFilter::try_new(&level)
        .map_err(|e| UpdaterError::Diagnostics(format!("invalid log level {level:?}: {e}")))?;

    let path = config.effective_path();
    let file = RotatingFileWriter::open(&path, config.max_size, config.max_files)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(file_writer);
    let console_layer = config.console_enabled().then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| UpdaterError::Diagnostics(format!("logging already initialised: {e}")))?;

    tracing::debug!(path = %path.display(), %level, "logging initialised");
    Ok(guard)
}
