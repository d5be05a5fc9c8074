//! Line-oriented driver for the host bridge.
//!
//! The reader loop parses [`Inbound`] lines and feeds the updater service;
//! a writer task serialises every [`Outbound`] message, in queue order, as
//! one JSON line. Stdout is reserved for the protocol: all diagnostic output
//! goes to the log file or stderr.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::contract::{Inbound, Outbound};
use super::{BridgeAnalytics, BridgeHost, BridgeNotifier, BridgeTransport, Outbox, WindowRegistry};
use crate::config::UpdaterConfig;
use crate::error::{Result, UpdaterError};
use crate::update::analytics::AnalyticsReporter;
use crate::update::channel::ChannelPolicy;
use crate::update::lifecycle::{Collaborators, LifecycleSettings, UpdateLifecycle};
use crate::update::pixel::PixelReporter;
use crate::update::service::{
    DEFAULT_QUEUE_CAPACITY, UpdaterHandle, UpdaterService, spawn_poller, updater_channel,
};

/// When to check without being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial_delay: Duration,
    /// Must be non-zero.
    pub interval: Duration,
}

impl PollSchedule {
    /// Schedule from config seconds. `None` when `interval_secs` is 0.
    #[must_use]
    pub fn from_secs(initial_delay_secs: u64, interval_secs: u64) -> Option<Self> {
        (interval_secs > 0).then(|| Self {
            initial_delay: Duration::from_secs(initial_delay_secs),
            interval: Duration::from_secs(interval_secs),
        })
    }
}

/// Everything the bridge needs to build its updater.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub policy: ChannelPolicy,
    pub settings: LifecycleSettings,
    /// Stats pixel URL. Without one, stats go to the shell as `analytics.stats`.
    pub analytics_endpoint: Option<String>,
    pub poll: Option<PollSchedule>,
    /// Active log file; it and its rotated siblings are archived on `logs.gather`.
    pub log_path: PathBuf,
    pub log_max_files: usize,
    /// Where `logs.gather` writes the archive.
    pub log_bundle_dir: PathBuf,
    pub queue_capacity: usize,
}

impl BridgeOptions {
    #[must_use]
    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self {
            policy: config.channel_policy(),
            settings: config.lifecycle_settings(),
            analytics_endpoint: config.analytics.endpoint.clone(),
            poll: PollSchedule::from_secs(
                config.update.initial_delay_secs,
                config.update.check_interval_secs,
            ),
            log_path: config.logging.effective_path(),
            log_max_files: config.logging.max_files,
            log_bundle_dir: crate::app_dirs::log_bundle_dir(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// How the bridge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    /// Input closed before any install.
    Eof,
    /// `host.exit` was written; the caller must end the process.
    HostExit,
}

/// Run the bridge until `reader` reaches EOF or `host.exit` has been written.
///
/// # Errors
///
/// Fails if the updater cannot be built, input cannot be read, or output
/// cannot be written.
pub async fn run_bridge<R, W>(reader: R, writer: W, options: BridgeOptions) -> Result<BridgeExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let out = Outbox::new(out_tx);
    let mut writer_task = tokio::spawn(write_outbound(out_rx, writer));

    let windows = WindowRegistry::default();
    let (handle, inbox) = updater_channel(options.queue_capacity);
    let lifecycle = UpdateLifecycle::new(
        options.policy,
        options.settings.clone(),
        Collaborators {
            transport: Box::new(BridgeTransport::new(out.clone())),
            notifier: Box::new(BridgeNotifier::new(out.clone())),
            analytics: build_reporter(options.analytics_endpoint.as_deref(), &out),
            host: Box::new(BridgeHost::new(out.clone(), windows.clone())),
        },
    )?;
    let service_task = tokio::spawn(UpdaterService::new(inbox, lifecycle).run());

    let cancel = CancellationToken::new();
    let poller = options.poll.map(|schedule| {
        spawn_poller(
            handle.clone(),
            schedule.initial_delay,
            schedule.interval,
            cancel.clone(),
        )
    });

    let mut lines = reader.lines();
    let mut writer_result = None;
    loop {
        tokio::select! {
            joined = &mut writer_task => {
                writer_result = Some(joined);
                break;
            }
            line = lines.next_line() => {
                let line = line.map_err(|e| {
                    UpdaterError::Channel(format!("failed to read bridge input: {e}"))
                })?;
                let Some(line) = line else {
                    tracing::info!("bridge input closed (EOF); shutting down");
                    break;
                };
                dispatch_line(line.trim(), &handle, &windows, &out, &options).await;
            }
        }
    }

    cancel.cancel();
    if let Some(poller) = poller
        && let Err(e) = poller.await
    {
        tracing::error!(error = %e, "check poller panicked");
    }
    drop(handle);
    drop(out);
    let last = service_task
        .await
        .map_err(|e| UpdaterError::Channel(format!("updater service panicked: {e}")))?;
    tracing::debug!(state = %last.state, "updater service finished");

    let joined = match writer_result {
        Some(joined) => joined,
        None => writer_task.await,
    };
    let saw_exit = joined
        .map_err(|e| UpdaterError::Channel(format!("bridge writer panicked: {e}")))??;
    Ok(if saw_exit {
        BridgeExit::HostExit
    } else {
        BridgeExit::Eof
    })
}

fn build_reporter(endpoint: Option<&str>, out: &Outbox) -> Box<dyn AnalyticsReporter> {
    if let Some(endpoint) = endpoint {
        match PixelReporter::new(endpoint, tokio::runtime::Handle::current()) {
            Ok(pixel) => return Box::new(pixel),
            Err(e) => {
                tracing::warn!(error = %e, "stats endpoint unusable; forwarding stats to host");
            }
        }
    }
    Box::new(BridgeAnalytics::new(out.clone()))
}

async fn dispatch_line(
    line: &str,
    handle: &UpdaterHandle,
    windows: &WindowRegistry,
    out: &Outbox,
    options: &BridgeOptions,
) {
    if line.is_empty() {
        return;
    }

    let message: Inbound = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, raw_line = %line, "failed to parse bridge message");
            reply(out, Outbound::error(format!("failed to parse message: {e}")));
            return;
        }
    };

    let result = if let Some(event) = message.transport_event() {
        handle.transport_event(event).await
    } else if let Some(decision) = message.decision() {
        handle.decide(decision).await
    } else {
        match message {
            Inbound::UpdateCheck => handle.start_check().await,
            Inbound::WindowOpened { id } => {
                windows.opened(id);
                Ok(())
            }
            Inbound::WindowClosed { id } => {
                windows.closed(id);
                Ok(())
            }
            Inbound::Status => handle.status().await.map(|session| {
                reply(out, Outbound::Status { session });
            }),
            Inbound::LogsGather => {
                gather_logs(out, options).await;
                Ok(())
            }
            _ => Ok(()),
        }
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "bridge message not delivered");
        reply(out, Outbound::error(e.to_string()));
    }
}

async fn gather_logs(out: &Outbox, options: &BridgeOptions) {
    let log_path = options.log_path.clone();
    let max_files = options.log_max_files;
    let dest = options.log_bundle_dir.clone();
    let archived = tokio::task::spawn_blocking(move || {
        crate::diagnostics::archive_logs(&log_path, max_files, &dest)
    })
    .await
    .map_err(|e| UpdaterError::Diagnostics(format!("log archive task failed: {e}")))
    .and_then(|r| r);
    match archived {
        Ok(path) => reply(out, Outbound::LogsGathered { path }),
        Err(e) => {
            tracing::error!(error = %e, "failed to gather logs");
            reply(out, Outbound::error(e.to_string()));
        }
    }
}

fn reply(out: &Outbox, message: Outbound) {
    if let Err(e) = out.send(message) {
        tracing::warn!(error = %e, "bridge reply dropped");
    }
}

/// Write queued messages as JSON lines. Returns `true` once `host.exit`
/// has been written, `false` if the queue closed first.
async fn write_outbound<W>(mut rx: mpsc::UnboundedReceiver<Outbound>, writer: W) -> Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    while let Some(message) = rx.recv().await {
        let json = serde_json::to_string(&message).map_err(|e| {
            UpdaterError::Channel(format!("failed to serialize {}: {e}", message.kind()))
        })?;
        write_line(&mut writer, &json).await?;
        if message == Outbound::HostExit {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Write a single JSON line to the buffered writer and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut BufWriter<W>, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| UpdaterError::Channel(format!("failed to write bridge output: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| UpdaterError::Channel(format!("failed to write newline: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| UpdaterError::Channel(format!("failed to flush bridge output: {e}")))?;
    Ok(())
}
