//! Core domain types for the vessel-tracking pipeline.
//!
//! - [`VesselReport`]: one canonical AIS position report
//! - [`FeatureVector`]: the model-ready representation of a report
//! - [`AnomalyVerdict`] / [`OilSpillFinding`]: scoring and escalation outputs
//! - [`StreamEvent`]: the two wire shapes delivered to subscribers

mod events;
mod report;

pub use events::{
    AnomalyVerdict, EscalationTask, FeatureAttribution, OilSpillFinding, SpillLikelihood,
    StreamEvent,
};
pub use report::{TimeOfDay, Timestamp, VesselReport};

/// Length of the model input row: five scaled continuous features, the raw
/// navigational-status code, and the encoded time-of-day bucket.
pub const MODEL_INPUT_LEN: usize = 7;

/// Model feature names in the exact order the classifier was trained on.
///
/// This ordering is a strict contract with the serialized model artifacts;
/// [`FeatureVector::as_input`] must match it element for element.
pub const MODEL_FEATURE_NAMES: [&str; MODEL_INPUT_LEN] = [
    "SOG_mean",
    "COG_mean",
    "LAT_mean",
    "LON_mean",
    "Heading_mean_heading",
    "Status_mode",
    "TimeOfDay_mode",
];

/// Model-ready feature row derived from one [`VesselReport`].
///
/// Continuous fields have already been passed through the fitted scaler;
/// `time_of_day` has been mapped through the fitted label encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    /// Scaled speed over ground.
    pub sog: f32,
    /// Scaled course over ground.
    pub cog: f32,
    /// Scaled latitude.
    pub lat: f32,
    /// Scaled longitude.
    pub lon: f32,
    /// Scaled true heading.
    pub heading: f32,
    /// Navigational-status code, passed through unscaled.
    pub status: f32,
    /// Label-encoded time-of-day bucket.
    pub time_of_day: f32,
}

impl FeatureVector {
    /// The feature row in training order (see [`MODEL_FEATURE_NAMES`]).
    pub fn as_input(&self) -> [f32; MODEL_INPUT_LEN] {
        [
            self.sog,
            self.cog,
            self.lat,
            self.lon,
            self.heading,
            self.status,
            self.time_of_day,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_order_matches_training_contract() {
        let fv = FeatureVector {
            sog: 1.0,
            cog: 2.0,
            lat: 3.0,
            lon: 4.0,
            heading: 5.0,
            status: 6.0,
            time_of_day: 7.0,
        };
        assert_eq!(fv.as_input(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(MODEL_FEATURE_NAMES.len(), MODEL_INPUT_LEN);
    }
}
