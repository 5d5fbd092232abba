//! Record processing pipeline.
//!
//! ```text
//! Feed Adapter ─▶ Streaming Queue ─▶ Feature Pipeline ─▶ Anomaly Scorer
//!                                        │                    │
//!                                        ▼                    ▼
//!                                  (drop + reason)   Broadcast Hub ── all events
//!                                                         │
//!                                                         ▼ (anomalous only)
//!                                                  Escalation Queue
//! ```
//!
//! Ordering within one vessel's reports follows arrival order (FIFO); no
//! ordering is promised between ingestion events and escalation events.

mod features;
mod processing_loop;
mod queue;

pub use features::{
    FeatureError, FeaturePipeline, FittedLabelEncoder, FittedScaler, CONTINUOUS_FEATURE_COUNT,
};
pub use processing_loop::{IngestStats, ProcessingLoop, SkipReason};
pub use queue::{stream_queue, stream_queue_with, QueueReceiver, QueueSender};
