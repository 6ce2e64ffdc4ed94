//! Push publishing of measurements to a collector.

use anyhow::Context;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use airnode_core::{ConfigurationRecord, Measurement, PublishingPolicy};
use airnode_protocol::render_telemetry;

pub struct Publisher {
    client: reqwest::Client,
}

impl Publisher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Whether `record` asks for measurements to be pushed.
    pub fn enabled(record: &ConfigurationRecord) -> bool {
        record.publishing_policy == PublishingPolicy::Push && !record.publishing_url.is_empty()
    }

    /// POST `measurement` to the configured collector.
    pub async fn publish(&self, record: &ConfigurationRecord, measurement: &Measurement) -> anyhow::Result<()> {
        let body = render_telemetry(&record.host_name, measurement)?;
        let mut request = self
            .client
            .post(record.publishing_url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if !record.publishing_username.is_empty() {
            request = request.basic_auth(
                record.publishing_username.as_str(),
                Some(record.publishing_password.as_str()),
            );
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("POST {} failed", record.publishing_url))?;
        response
            .error_for_status()
            .context("Collector rejected measurement")?;
        debug!(url = %record.publishing_url, "Measurement published");
        Ok(())
    }
}
