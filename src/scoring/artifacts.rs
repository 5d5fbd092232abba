//! Model artifact loading.
//!
//! The model directory holds the serialized training outputs:
//!
//! - `scaler.json` — fitted standard scaler (mean/scale per continuous feature)
//! - `label_encoder.json` — fitted time-of-day vocabulary
//! - `anomaly_bilstm.onnx` — the exported sequence classifier
//! - `oilspill.onnx` — companion spill-likelihood model (optional; a
//!   deterministic heuristic stands in when absent)
//!
//! Everything loads exactly once at process startup. Absence or schema
//! mismatch of a required artifact is fatal — the service must not accept
//! subscribers half-initialized.

use std::path::{Path, PathBuf};

use ort::session::{builder::GraphOptimizationLevel, Session};
use thiserror::Error;
use tracing::{info, warn};

use crate::pipeline::{FittedLabelEncoder, FittedScaler};

pub const SCALER_FILE: &str = "scaler.json";
pub const ENCODER_FILE: &str = "label_encoder.json";
pub const ANOMALY_MODEL_FILE: &str = "anomaly_bilstm.onnx";
pub const SPILL_MODEL_FILE: &str = "oilspill.onnx";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model artifact missing: {0}")]
    Missing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Schema {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to load ONNX model {path}: {source}")]
    Onnx { path: PathBuf, source: ort::Error },

    #[error("label encoder vocabulary does not cover all time-of-day buckets")]
    IncompleteVocabulary,
}

/// A loaded ONNX session with its resolved I/O names.
pub struct LoadedModel {
    pub name: String,
    pub session: Session,
    pub input_name: String,
    pub output_name: String,
}

impl LoadedModel {
    fn load(path: &Path, name: &str, onnx_threads: usize) -> Result<Self, ArtifactError> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|source| ArtifactError::Onnx {
                path: path.to_path_buf(),
                source,
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());
        let output_name = session
            .outputs
            .last()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output".to_string());

        info!(
            model = name,
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            "Model loaded"
        );

        Ok(Self {
            name: name.to_string(),
            session,
            input_name,
            output_name,
        })
    }
}

/// The full artifact set the scorer and feature pipeline share.
pub struct ModelArtifacts {
    pub scaler: FittedScaler,
    pub encoder: FittedLabelEncoder,
    pub anomaly_model: LoadedModel,
    pub spill_model: Option<LoadedModel>,
}

impl ModelArtifacts {
    /// Load every artifact from the model directory.
    pub fn load(dir: &Path, onnx_threads: usize) -> Result<Self, ArtifactError> {
        ort::init()
            .commit()
            .map_err(|source| ArtifactError::Onnx {
                path: dir.to_path_buf(),
                source,
            })?;

        let scaler: FittedScaler = read_json(&dir.join(SCALER_FILE))?;
        let encoder: FittedLabelEncoder = read_json(&dir.join(ENCODER_FILE))?;
        if !encoder.covers_time_of_day() {
            return Err(ArtifactError::IncompleteVocabulary);
        }

        let anomaly_path = dir.join(ANOMALY_MODEL_FILE);
        if !anomaly_path.exists() {
            return Err(ArtifactError::Missing(anomaly_path));
        }
        let anomaly_model = LoadedModel::load(&anomaly_path, "anomaly_bilstm", onnx_threads)?;

        let spill_path = dir.join(SPILL_MODEL_FILE);
        let spill_model = if spill_path.exists() {
            Some(LoadedModel::load(&spill_path, "oilspill", onnx_threads)?)
        } else {
            warn!(
                path = %spill_path.display(),
                "Spill model not found — using the kinematic heuristic"
            );
            None
        };

        info!(dir = %dir.display(), "Model artifacts loaded");
        Ok(Self {
            scaler,
            encoder,
            anomaly_model,
            spill_model,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Schema {
        path: path.to_path_buf(),
        source,
    })
}
