//! Model-agnostic feature attribution for escalated verdicts.
//!
//! Perturbs one input feature at a time (zeroing it, i.e. snapping a scaled
//! feature to the training mean) and records how far the anomaly
//! probability moves. The resulting contributions are the explanatory
//! artifact attached to oil-spill findings.

use std::sync::Arc;

use super::{Scorer, ScoringError};
use crate::types::{FeatureAttribution, FeatureVector, MODEL_FEATURE_NAMES, MODEL_INPUT_LEN};

pub struct PerturbationExplainer {
    scorer: Arc<dyn Scorer>,
}

impl PerturbationExplainer {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// Per-feature contribution: `p(original) - p(feature zeroed)`.
    ///
    /// Positive values mean the feature pushed the verdict toward anomalous.
    pub fn attributions(
        &self,
        features: &FeatureVector,
    ) -> Result<Vec<FeatureAttribution>, ScoringError> {
        let baseline = self.scorer.score(features)?.anomaly_probability;
        let mut out = Vec::with_capacity(MODEL_INPUT_LEN);

        for (idx, name) in MODEL_FEATURE_NAMES.iter().enumerate() {
            let mut perturbed = features.as_input();
            perturbed[idx] = 0.0;
            let fv = FeatureVector {
                sog: perturbed[0],
                cog: perturbed[1],
                lat: perturbed[2],
                lon: perturbed[3],
                heading: perturbed[4],
                status: perturbed[5],
                time_of_day: perturbed[6],
            };
            let probability = self.scorer.score(&fv)?.anomaly_probability;
            out.push(FeatureAttribution {
                feature: (*name).to_string(),
                contribution: baseline - probability,
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnomalyVerdict;

    /// Probability proportional to the SOG input alone.
    struct SogScorer;

    impl Scorer for SogScorer {
        fn score(&self, features: &FeatureVector) -> Result<AnomalyVerdict, ScoringError> {
            let p = f64::from(features.sog).clamp(0.0, 1.0);
            Ok(AnomalyVerdict::from_probabilities(p, 0.0))
        }
    }

    #[test]
    fn attribution_isolates_the_driving_feature() {
        let explainer = PerturbationExplainer::new(Arc::new(SogScorer));
        let fv = FeatureVector {
            sog: 0.8,
            cog: 0.5,
            lat: 0.5,
            lon: 0.5,
            heading: 0.5,
            status: 0.0,
            time_of_day: 2.0,
        };
        let attributions = explainer.attributions(&fv).expect("attributions");
        assert_eq!(attributions.len(), MODEL_INPUT_LEN);
        assert!((attributions[0].contribution - 0.8).abs() < 1e-9);
        for attr in &attributions[1..] {
            assert!(attr.contribution.abs() < 1e-9, "{}", attr.feature);
        }
    }
}
