//! Anomaly scoring against the pretrained sequence classifier.
//!
//! Artifacts (fitted scaler, fitted label encoder, model weights) are
//! loaded once at startup via [`ModelArtifacts::load`]; a missing or
//! malformed artifact is a fatal startup error. Scoring itself sits behind
//! the [`Scorer`] trait so the processing loop and tests can swap in
//! deterministic stubs.

mod artifacts;
pub mod explain;
mod model;

pub use artifacts::{ArtifactError, LoadedModel, ModelArtifacts};
pub use model::OnnxScorer;

use thiserror::Error;

use crate::types::{AnomalyVerdict, FeatureVector};

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("model produced no usable output tensor")]
    EmptyOutput,
}

/// Scores one feature vector into a complete verdict.
///
/// Implementations must be safe to call from multiple tasks: the loaded
/// weights are read-only after startup, and any non-reentrant session state
/// is serialized internally.
pub trait Scorer: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<AnomalyVerdict, ScoringError>;
}

/// Numerically stable logistic sigmoid.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_bounded_and_monotonic() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-40.0) < 1e-12);
        assert!(sigmoid(40.0) > 1.0 - 1e-12);
        assert!(sigmoid(1.0) > sigmoid(0.5));
    }
}
