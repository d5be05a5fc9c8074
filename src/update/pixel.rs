//! Stats-pixel analytics reporter.
//!
//! Each record becomes one HTTP GET against the configured pixel endpoint
//! with an `x_<group>=<name>` query pair per stat. Requests run on the tokio
//! runtime and nobody waits for them.

use std::time::Duration;

use tokio::runtime::Handle;
use url::Url;

use super::analytics::{AnalyticsRecord, AnalyticsReporter};
use crate::error::{Result, UpdaterError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reporter that bumps stats through an HTTP pixel.
pub struct PixelReporter {
    client: reqwest::Client,
    endpoint: Url,
    runtime: Handle,
}

impl PixelReporter {
    /// Build a reporter for `endpoint`, spawning requests on `runtime`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an absolute http(s) URL or
    /// the HTTP client cannot be built.
    pub fn new(endpoint: &str, runtime: Handle) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| UpdaterError::Config(format!("invalid pixel endpoint {endpoint}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(UpdaterError::Config(format!(
                "pixel endpoint must be http(s), got {}",
                endpoint.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("desktop-updater/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpdaterError::Analytics(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            runtime,
        })
    }

    /// The URL a record is reported to.
    #[must_use]
    pub fn pixel_url(&self, record: &AnalyticsRecord) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for stat in &record.stats {
                query.append_pair(&format!("x_{}", stat.group), &stat.name);
            }
            // Cache buster.
            query.append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        }
        url
    }
}

impl AnalyticsReporter for PixelReporter {
    fn record(&self, record: &AnalyticsRecord) -> Result<()> {
        if record.stats.is_empty() {
            return Ok(());
        }

        let url = self.pixel_url(record);
        let client = self.client.clone();
        let event = record.event.name();
        self.runtime.spawn(async move {
            match client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(target: "desktop::analytics", event, "stat pixel sent");
                }
                Ok(resp) => {
                    tracing::warn!(
                        target: "desktop::analytics",
                        event,
                        status = %resp.status(),
                        "stat pixel rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "desktop::analytics",
                        event,
                        error = %e,
                        "stat pixel failed"
                    );
                }
            }
        });
        Ok(())
    }
}
