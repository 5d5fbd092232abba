//! Vessel feed acquisition.
//!
//! Normalizes raw external position feeds into canonical [`VesselReport`]s
//! and applies the geographic bounding-box filter. Sources are swappable
//! behind the [`FeedSource`] trait: polled REST, push socket, or synthetic.

mod poller;
mod rest_feed;
mod socket_feed;
mod synthetic;

pub use poller::run_feed_poller;
pub use rest_feed::RestFeed;
pub use socket_feed::SocketFeed;
pub use synthetic::SyntheticFeed;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::config::BoundingBox;
use crate::types::VesselReport;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed feed payload: {0}")]
    Payload(String),

    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait abstracting where raw vessel records come from.
///
/// Implementations handle protocol details (handshakes, reconnection)
/// internally and yield raw JSON records for [`filter_reports`] to
/// normalize. A fetch failure yields `Err` for that cycle; the polling loop
/// itself never stops on it.
#[async_trait]
pub trait FeedSource: Send + 'static {
    /// Fetch the next batch of raw records. May block on network I/O.
    async fn fetch_batch(&mut self) -> Result<Vec<serde_json::Value>, FeedError>;

    /// Delay between fetch cycles. Push sources return zero.
    fn poll_interval(&self) -> Duration;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

/// Normalize raw feed records into canonical reports, dropping anything
/// missing coordinates or outside the configured box (boundary-inclusive).
///
/// Records may arrive flat or nested under an `"AIS"` key. Per-record parse
/// failures are logged skips, never errors.
pub fn filter_reports(raw: Vec<serde_json::Value>, bbox: &BoundingBox) -> Vec<VesselReport> {
    let mut reports = Vec::new();

    for entry in raw {
        let record = match entry.get("AIS") {
            Some(inner) => inner.clone(),
            None => entry,
        };

        let latitude = record.get("LATITUDE").and_then(serde_json::Value::as_f64);
        let longitude = record.get("LONGITUDE").and_then(serde_json::Value::as_f64);
        let (Some(lat), Some(lon)) = (latitude, longitude) else {
            continue;
        };
        if !bbox.contains(lat, lon) {
            continue;
        }

        match serde_json::from_value::<VesselReport>(record) {
            Ok(report) => reports.push(report),
            Err(e) => warn!(error = %e, "Skipping unparsable feed record"),
        }
    }

    reports
}
