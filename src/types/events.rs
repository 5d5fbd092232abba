//! Scoring verdicts, escalation tasks, and the subscriber wire shapes.

use serde::{Deserialize, Serialize};

use super::{FeatureVector, VesselReport};
use crate::config::defaults::{ANOMALY_PROBABILITY_THRESHOLD, OIL_SPILL_PROBABILITY_THRESHOLD};

/// Companion oil-spill likelihood produced alongside every anomaly score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpillLikelihood {
    pub oil_spill_probability: f64,
    pub oil_spill: bool,
}

impl SpillLikelihood {
    /// Apply the fixed decision threshold to a raw probability.
    pub fn from_probability(probability: f64) -> Self {
        Self {
            oil_spill_probability: probability,
            oil_spill: probability > OIL_SPILL_PROBABILITY_THRESHOLD,
        }
    }
}

/// Output of scoring one [`FeatureVector`].
///
/// `anomaly` is a deterministic function of `anomaly_probability` and the
/// fixed threshold; a verdict is produced whole or the record is dropped —
/// partial verdicts are never broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub anomaly: bool,
    pub anomaly_probability: f64,
    #[serde(flatten)]
    pub spill: SpillLikelihood,
}

impl AnomalyVerdict {
    /// Build a verdict from the two model probabilities, applying both
    /// calibrated thresholds.
    pub fn from_probabilities(anomaly_probability: f64, spill_probability: f64) -> Self {
        Self {
            anomaly: anomaly_probability > ANOMALY_PROBABILITY_THRESHOLD,
            anomaly_probability,
            spill: SpillLikelihood::from_probability(spill_probability),
        }
    }
}

/// Per-feature attribution attached to escalated findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub contribution: f64,
}

/// An anomalous report bundled for the imaging pipeline.
#[derive(Debug, Clone)]
pub struct EscalationTask {
    pub report: VesselReport,
    pub verdict: AnomalyVerdict,
    pub features: FeatureVector,
}

/// Result of running one escalated report through the SAR imaging and
/// vision collaborators.
///
/// Field names mirror the detection service's response document; downstream
/// consumers key on them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OilSpillFinding {
    #[serde(rename = "Predicted Class")]
    pub predicted_class: i64,
    #[serde(rename = "Annotated_image")]
    pub annotated_image: String,
    #[serde(rename = "Oilspill_Area")]
    pub area_sqkm: f64,
    #[serde(rename = "SAR_image", default, skip_serializing_if = "Option::is_none")]
    pub sar_image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_attributions: Vec<FeatureAttribution>,
}

/// One message delivered to every live subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// Ingestion-stream result: the report plus its verdict.
    Ingestion {
        ais_data: VesselReport,
        anomaly_result: AnomalyVerdict,
    },
    /// Escalation result: a completed oil-spill finding for one vessel.
    Escalation {
        mmsi: u64,
        oil_spill_prediction: OilSpillFinding,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anomaly_flag_tracks_threshold_across_sweep() {
        let mut p = 0.0;
        while p <= 1.0 {
            let verdict = AnomalyVerdict::from_probabilities(p, 0.0);
            assert_eq!(
                verdict.anomaly,
                p > ANOMALY_PROBABILITY_THRESHOLD,
                "probability {p}"
            );
            p += 0.01;
        }
    }

    #[test]
    fn verdict_serializes_flat() {
        let verdict = AnomalyVerdict::from_probabilities(0.9, 0.7);
        let json = serde_json::to_value(verdict).expect("serializable");
        assert_eq!(json["anomaly"], serde_json::json!(true));
        assert_eq!(json["anomaly_probability"], serde_json::json!(0.9));
        // Spill sub-result flattens to the same level.
        assert_eq!(json["oil_spill_probability"], serde_json::json!(0.7));
        assert_eq!(json["oil_spill"], serde_json::json!(true));
    }

    #[test]
    fn ingestion_event_wire_shape() {
        let report: VesselReport = serde_json::from_value(serde_json::json!({
            "MMSI": 99_u64, "LATITUDE": 20.0, "LONGITUDE": -90.0
        }))
        .expect("valid report");
        let event = StreamEvent::Ingestion {
            ais_data: report,
            anomaly_result: AnomalyVerdict::from_probabilities(0.1, 0.1),
        };
        let json = serde_json::to_value(&event).expect("serializable");
        assert!(json.get("ais_data").is_some());
        assert!(json.get("anomaly_result").is_some());
        assert_eq!(json["ais_data"]["MMSI"], serde_json::json!(99));
    }

    #[test]
    fn escalation_event_wire_shape() {
        let event = StreamEvent::Escalation {
            mmsi: 123,
            oil_spill_prediction: OilSpillFinding {
                predicted_class: 1,
                annotated_image: "aGVsbG8=".to_string(),
                area_sqkm: 12.5,
                sar_image: None,
                feature_attributions: Vec::new(),
            },
        };
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["mmsi"], serde_json::json!(123));
        assert_eq!(
            json["oil_spill_prediction"]["Predicted Class"],
            serde_json::json!(1)
        );
        assert_eq!(
            json["oil_spill_prediction"]["Oilspill_Area"],
            serde_json::json!(12.5)
        );
    }
}
