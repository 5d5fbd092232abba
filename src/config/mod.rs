//! Application configuration.
//!
//! Everything externally supplied comes in through the environment (with
//! `.env` support via `dotenvy`) and can be overridden per-run by CLI flags.
//! Calibrated constants live in [`defaults`]; nothing operational is
//! hardcoded in the pipeline modules.
//!
//! Environment variables:
//!
//! - `SPILL_SERVER_ADDR` — bind address for the client-facing endpoint
//! - `SPILL_FEED_MODE` — `rest`, `socket`, or `synthetic`
//! - `SPILL_FEED_URL` — polled REST URL or `host:port` for the socket feed
//! - `SPILL_FEED_API_KEY` — API key for the socket subscribe handshake
//! - `SPILL_MODEL_DIR` — directory holding the serialized model artifacts
//! - `SPILL_IMAGERY_URL` — SAR imagery service endpoint
//! - `SPILL_DETECTION_URL` — oil-spill detection service endpoint
//! - `SPILL_REPORT_STORE_URL` — report persistence endpoint (optional)
//! - `SPILL_NOTIFY_URL` — push-notification endpoint (optional)
//! - `SPILL_LAT_MIN` / `SPILL_LAT_MAX` / `SPILL_LON_MIN` / `SPILL_LON_MAX`
//!   — monitored bounding box
//! - `SPILL_ONNX_THREADS` — intra-op thread count for inference

pub mod defaults;

use defaults::{DEFAULT_LAT_RANGE, DEFAULT_LON_RANGE, DEFAULT_ONNX_THREADS};

/// Geographic rectangle the feed is filtered against (boundary-inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Whether a coordinate lies inside the box, edges included.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            lat_min: DEFAULT_LAT_RANGE.0,
            lat_max: DEFAULT_LAT_RANGE.1,
            lon_min: DEFAULT_LON_RANGE.0,
            lon_max: DEFAULT_LON_RANGE.1,
        }
    }
}

/// How raw vessel reports reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FeedMode {
    /// Polled HTTP GET returning a JSON array of position records.
    Rest,
    /// Push socket feed with a subscribe handshake.
    Socket,
    /// Locally generated reports, for demos and smoke tests.
    Synthetic,
}

/// Application configuration assembled from environment and CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address for the client-facing stream endpoint.
    pub server_addr: String,
    pub feed_mode: FeedMode,
    /// REST URL or `host:port`, depending on the feed mode.
    pub feed_url: String,
    pub feed_api_key: String,
    /// Directory holding scaler, label encoder, and model weights.
    pub model_dir: String,
    pub imagery_url: String,
    pub detection_url: String,
    /// Report persistence endpoint; `None` disables persistence.
    pub report_store_url: Option<String>,
    /// Push-notification endpoint; `None` disables notifications.
    pub notify_url: Option<String>,
    pub bounding_box: BoundingBox,
    pub onnx_threads: usize,
}

impl AppConfig {
    /// Build the configuration from the environment.
    pub fn from_env() -> Self {
        let bounding_box = BoundingBox {
            lat_min: env_f64("SPILL_LAT_MIN", DEFAULT_LAT_RANGE.0),
            lat_max: env_f64("SPILL_LAT_MAX", DEFAULT_LAT_RANGE.1),
            lon_min: env_f64("SPILL_LON_MIN", DEFAULT_LON_RANGE.0),
            lon_max: env_f64("SPILL_LON_MAX", DEFAULT_LON_RANGE.1),
        };

        let feed_mode = match std::env::var("SPILL_FEED_MODE").as_deref() {
            Ok("socket") => FeedMode::Socket,
            Ok("synthetic") => FeedMode::Synthetic,
            _ => FeedMode::Rest,
        };

        Self {
            server_addr: env_or("SPILL_SERVER_ADDR", "0.0.0.0:8765"),
            feed_mode,
            feed_url: env_or("SPILL_FEED_URL", ""),
            feed_api_key: env_or("SPILL_FEED_API_KEY", ""),
            model_dir: env_or("SPILL_MODEL_DIR", "models/lstm_model_7"),
            imagery_url: env_or("SPILL_IMAGERY_URL", "http://localhost:5001/process-sentinel-image"),
            detection_url: env_or("SPILL_DETECTION_URL", "http://localhost:5000/detect/"),
            report_store_url: std::env::var("SPILL_REPORT_STORE_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            notify_url: std::env::var("SPILL_NOTIFY_URL").ok().filter(|v| !v.is_empty()),
            bounding_box,
            onnx_threads: std::env::var("SPILL_ONNX_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ONNX_THREADS),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_is_edge_inclusive() {
        let bbox = BoundingBox::default();
        assert!(bbox.contains(15.0, -100.0));
        assert!(bbox.contains(30.0, -80.0));
        assert!(bbox.contains(20.0, -90.0));
        assert!(!bbox.contains(14.999, -90.0));
        assert!(!bbox.contains(30.001, -90.0));
        assert!(!bbox.contains(20.0, -100.001));
        assert!(!bbox.contains(20.0, -79.999));
    }
}
