//! ONNX-backed scorer implementation.

use parking_lot::Mutex;
use tracing::debug;

use super::{sigmoid, LoadedModel, ModelArtifacts, Scorer, ScoringError};
use crate::types::{AnomalyVerdict, FeatureVector, MODEL_INPUT_LEN};

/// Scorer over the exported bidirectional sequence classifier plus the
/// companion spill-likelihood model.
///
/// ONNX sessions take `&mut self` to run, so each session sits behind a
/// mutex — concurrent scoring calls are explicitly serialized per model.
/// The weights themselves are never mutated after load.
pub struct OnnxScorer {
    anomaly: Mutex<LoadedModel>,
    spill: Option<Mutex<LoadedModel>>,
}

impl OnnxScorer {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        Self {
            anomaly: Mutex::new(artifacts.anomaly_model),
            spill: artifacts.spill_model.map(Mutex::new),
        }
    }

    /// Run one model over the feature row as a single-timestep sequence
    /// (`[batch=1, seq=1, features=7]`) and sigmoid the scalar logit.
    fn run_model(model: &mut LoadedModel, features: &FeatureVector) -> Result<f64, ScoringError> {
        use ort::value::Tensor;

        let shape = vec![1_i64, 1, MODEL_INPUT_LEN as i64];
        let input = Tensor::from_array((shape, features.as_input().to_vec()))?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input])?;

        let fallback = outputs.iter().next().map(|(_, v)| v);
        let output = outputs
            .get(&model.output_name)
            .or_else(|| fallback.as_deref())
            .ok_or(ScoringError::EmptyOutput)?;
        let (_, data) = output.try_extract_tensor::<f32>()?;
        let logit = data.first().copied().ok_or(ScoringError::EmptyOutput)?;

        Ok(sigmoid(f64::from(logit)))
    }

    /// Companion spill likelihood: model when loaded, kinematic heuristic
    /// otherwise. Nearly stationary vessels (scaled SOG well below the
    /// training mean) holding an at-anchor / not-under-command status are
    /// the dominant slick sources.
    fn spill_probability(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        if let Some(model) = &self.spill {
            return Self::run_model(&mut model.lock(), features);
        }

        let slow = f64::from(-features.sog).max(0.0);
        #[allow(clippy::cast_possible_truncation)]
        let status_risk = match features.status as i64 {
            1 | 2 | 5 | 6 => 1.0,
            _ => 0.0,
        };
        Ok(sigmoid(slow + status_risk - 2.0))
    }
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &FeatureVector) -> Result<AnomalyVerdict, ScoringError> {
        let anomaly_probability = Self::run_model(&mut self.anomaly.lock(), features)?;
        let spill_probability = self.spill_probability(features)?;

        debug!(
            anomaly_probability,
            spill_probability, "Feature vector scored"
        );
        Ok(AnomalyVerdict::from_probabilities(
            anomaly_probability,
            spill_probability,
        ))
    }
}
