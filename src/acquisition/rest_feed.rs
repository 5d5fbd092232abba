//! Polled REST feed source.

use std::time::Duration;

use async_trait::async_trait;

use super::{FeedError, FeedSource};
use crate::config::defaults::FEED_POLL_INTERVAL_SECS;

/// Fetches a JSON array of position records from a configured URL on a
/// fixed polling interval.
pub struct RestFeed {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl RestFeed {
    pub fn new(url: &str) -> Self {
        Self::with_interval(url, Duration::from_secs(FEED_POLL_INTERVAL_SECS))
    }

    pub fn with_interval(url: &str, interval: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            interval,
        }
    }
}

#[async_trait]
impl FeedSource for RestFeed {
    async fn fetch_batch(&mut self) -> Result<Vec<serde_json::Value>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let payload: serde_json::Value = response.json().await?;
        match payload {
            serde_json::Value::Array(records) => Ok(records),
            other => Err(FeedError::Payload(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }

    fn source_name(&self) -> &str {
        "REST"
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
