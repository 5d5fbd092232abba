//! System-wide default constants.
//!
//! Centralises the calibrated and operational magic numbers in one place.
//! Grouped by subsystem.

// ============================================================================
// Scoring
// ============================================================================

/// Anomaly decision threshold on the classifier's sigmoid output.
///
/// Calibrated on historical AIS data; not runtime-configurable.
pub const ANOMALY_PROBABILITY_THRESHOLD: f64 = 0.32;

/// Oil-spill likelihood decision threshold for the companion model.
pub const OIL_SPILL_PROBABILITY_THRESHOLD: f64 = 0.5;

/// Default intra-op thread count for ONNX Runtime sessions.
pub const DEFAULT_ONNX_THREADS: usize = 1;

// ============================================================================
// Feed Adapter
// ============================================================================

/// Interval between polled feed fetch cycles (seconds).
pub const FEED_POLL_INTERVAL_SECS: u64 = 120;

/// Pacing delay between enqueueing consecutive records from one fetch
/// cycle (milliseconds), so the queue fills at a drainable rate instead of
/// bursting a whole batch at once.
pub const ENQUEUE_PACING_MS: u64 = 500;

/// Reconnect delay after the push socket feed drops (seconds).
pub const SOCKET_FEED_RECONNECT_SECS: u64 = 5;

/// Keep-alive ping interval for the push socket feed (seconds).
pub const SOCKET_FEED_PING_SECS: u64 = 20;

// ============================================================================
// Streaming Queue
// ============================================================================

/// Bounded capacity of the ingestion queue (records).
pub const STREAM_QUEUE_CAPACITY: usize = 1024;

/// Consumer-side receive timeout (seconds), so the processing loop can
/// observe "no data" and run its housekeeping/shutdown checks.
pub const STREAM_QUEUE_RECV_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Escalation
// ============================================================================

/// Bounded capacity of the escalation queue (tasks).
///
/// When full, new tasks are rejected and counted rather than growing the
/// queue without bound under sustained anomaly bursts.
pub const ESCALATION_QUEUE_CAPACITY: usize = 256;

/// Lookback window for the SAR imagery search (days). Fixed alongside the
/// anomaly threshold during calibration.
pub const SAR_LOOKBACK_DAYS: i64 = 30;

/// HTTP timeout for the imagery and detection collaborators (seconds).
/// Scene acquisition on the remote side can take most of a minute.
pub const COLLABORATOR_HTTP_TIMEOUT_SECS: u64 = 90;

// ============================================================================
// Geographic Filter
// ============================================================================

/// Default monitored bounding box: Gulf of Mexico.
pub const DEFAULT_LAT_RANGE: (f64, f64) = (15.0, 30.0);
pub const DEFAULT_LON_RANGE: (f64, f64) = (-100.0, -80.0);
