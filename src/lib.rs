//! Spill Sentinel: live AIS anomaly detection with SAR oil-spill escalation.
//!
//! ## Architecture
//!
//! - **Feed Adapter**: normalizes a polled REST or push-socket vessel feed
//!   and applies the geographic bounding-box filter
//! - **Streaming Queue**: bounded backpressure buffer between feed and
//!   consumer
//! - **Feature Pipeline + Anomaly Scorer**: fitted-transform features, then
//!   a pretrained sequence classifier with a companion spill likelihood
//! - **Escalation Worker**: routes anomalies through the SAR imaging and
//!   vision collaborators off the ingestion path
//! - **Broadcast Hub**: fans every completed result out to live WebSocket
//!   subscribers

pub mod acquisition;
pub mod api;
pub mod config;
pub mod escalation;
pub mod hub;
pub mod pipeline;
pub mod scoring;
pub mod storage;
pub mod types;

// Re-export the configuration entry points
pub use config::{AppConfig, BoundingBox, FeedMode};

// Re-export commonly used types
pub use types::{
    AnomalyVerdict, EscalationTask, FeatureVector, OilSpillFinding, StreamEvent, TimeOfDay,
    VesselReport,
};

// Re-export pipeline components
pub use hub::BroadcastHub;
pub use pipeline::{FeaturePipeline, ProcessingLoop};
pub use scoring::{ModelArtifacts, OnnxScorer, Scorer};
