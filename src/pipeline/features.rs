//! Per-record feature transform: canonical rename, time-of-day bucketing,
//! categorical encoding, and continuous-feature scaling.
//!
//! The output must match what the classifier was trained on exactly — the
//! scaler and label encoder are the fitted artifacts from training, applied
//! verbatim, and the field order is the contract in
//! [`crate::types::MODEL_FEATURE_NAMES`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FeatureVector, TimeOfDay, VesselReport};

/// Number of continuous features run through the scaler.
pub const CONTINUOUS_FEATURE_COUNT: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("report {mmsi} is missing required field {field}")]
    MissingField { mmsi: u64, field: &'static str },

    #[error("time-of-day bucket {0:?} is not in the encoder vocabulary")]
    UnknownCategory(String),
}

/// Fitted standard scaler: `(x - mean) / scale` per continuous feature, in
/// training order (SOG, COG, LAT, LON, Heading).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedScaler {
    pub mean: [f64; CONTINUOUS_FEATURE_COUNT],
    pub scale: [f64; CONTINUOUS_FEATURE_COUNT],
}

impl FittedScaler {
    /// Identity transform: passes values through unscaled. Useful for
    /// fixtures and for feeds already normalized upstream.
    pub fn identity() -> Self {
        Self {
            mean: [0.0; CONTINUOUS_FEATURE_COUNT],
            scale: [1.0; CONTINUOUS_FEATURE_COUNT],
        }
    }

    fn apply(&self, values: [f64; CONTINUOUS_FEATURE_COUNT]) -> [f32; CONTINUOUS_FEATURE_COUNT] {
        let mut out = [0.0_f32; CONTINUOUS_FEATURE_COUNT];
        for (i, value) in values.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let scaled = ((value - self.mean[i]) / self.scale[i]) as f32;
            out[i] = scaled;
        }
        out
    }
}

/// Fitted label encoder: ordered class list from training. `transform`
/// maps a label to its index and refuses anything outside the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedLabelEncoder {
    pub classes: Vec<String>,
}

impl FittedLabelEncoder {
    /// Encoder over the five time-of-day buckets in lexicographic order,
    /// matching how the training-side encoder was fit.
    pub fn time_of_day() -> Self {
        Self {
            classes: ["Afternoon", "Evening", "Morning", "Night", "Unknown"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    pub fn transform(&self, label: &str) -> Result<f32, FeatureError> {
        self.classes
            .iter()
            .position(|c| c == label)
            .map(|idx| {
                #[allow(clippy::cast_precision_loss)]
                let encoded = idx as f32;
                encoded
            })
            .ok_or_else(|| FeatureError::UnknownCategory(label.to_string()))
    }

    /// Whether every time-of-day bucket, `Unknown` included, is encodable.
    /// Checked once at artifact load; an encoder without `Unknown` is a
    /// configuration defect, not a per-record error.
    pub fn covers_time_of_day(&self) -> bool {
        [
            TimeOfDay::Morning,
            TimeOfDay::Afternoon,
            TimeOfDay::Evening,
            TimeOfDay::Night,
            TimeOfDay::Unknown,
        ]
        .iter()
        .all(|bucket| self.classes.iter().any(|c| c == bucket.as_label()))
    }
}

/// Pure transform from [`VesselReport`] to [`FeatureVector`].
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    scaler: FittedScaler,
    encoder: FittedLabelEncoder,
}

impl FeaturePipeline {
    pub fn new(scaler: FittedScaler, encoder: FittedLabelEncoder) -> Self {
        Self { scaler, encoder }
    }

    /// Transform one report. Missing required fields and unencodable
    /// categories are data errors — the record is dropped upstream, never
    /// silently zero-filled.
    pub fn transform(&self, report: &VesselReport) -> Result<FeatureVector, FeatureError> {
        let missing = |field| FeatureError::MissingField {
            mmsi: report.mmsi,
            field,
        };

        let sog = report.speed.ok_or_else(|| missing("SPEED"))?;
        let cog = report.course.ok_or_else(|| missing("COURSE"))?;
        let heading = report.heading.ok_or_else(|| missing("HEADING"))?;
        let navstat = report.navstat.ok_or_else(|| missing("NAVSTAT"))?;

        let bucket = TimeOfDay::from_timestamp(report.timestamp.as_ref());
        let time_of_day = self.encoder.transform(bucket.as_label())?;

        let [sog, cog, lat, lon, heading] = self.scaler.apply([
            sog,
            cog,
            report.latitude,
            report.longitude,
            heading,
        ]);

        #[allow(clippy::cast_precision_loss)]
        let status = navstat as f32;

        Ok(FeatureVector {
            sog,
            cog,
            lat,
            lon,
            heading,
            status,
            time_of_day,
        })
    }
}
