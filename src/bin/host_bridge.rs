//! Headless updater host for stdin/stdout JSON communication.
//!
//! Reads `Inbound` messages as newline-delimited JSON from stdin, feeds them
//! to the update lifecycle, and writes `Outbound` messages to stdout.
//!
//! All tracing output goes to the log file (and stderr when console logging
//! is on) so that stdout remains a clean JSON protocol channel.

use desktop_updater::UpdaterConfig;
use desktop_updater::bridge::stdio::{BridgeExit, BridgeOptions, run_bridge};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(UpdaterConfig::default_config_path);
    let config = UpdaterConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config_path.display()))?;

    let log_guard = desktop_updater::diagnostics::logging::init(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    tracing::info!(
        version = %config.app.version,
        channel = %config.channel_policy().channel,
        "desktop-updater-host starting"
    );

    let exit = run_bridge(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        BridgeOptions::from_config(&config),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "desktop-updater-host exited with error");
        anyhow::anyhow!("desktop-updater-host failed: {e}")
    })?;

    match exit {
        BridgeExit::HostExit => {
            tracing::info!("exiting for update install");
            drop(log_guard);
            std::process::exit(0);
        }
        BridgeExit::Eof => {
            tracing::info!("desktop-updater-host shut down cleanly");
        }
    }
    Ok(())
}
