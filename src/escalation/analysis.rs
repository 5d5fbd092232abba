//! Oil-spill segmentation and classification collaborator.
//!
//! The detection service runs the vision stack (masking, UNet segmentation,
//! ResNet classification, overlay rendering) over one SAR scene. This
//! module only speaks its HTTP contract and shapes the response into an
//! [`OilSpillFinding`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{EscalationError, SarScene};
use crate::config::defaults::COLLABORATOR_HTTP_TIMEOUT_SECS;
use crate::types::OilSpillFinding;

#[async_trait]
pub trait SpillAnalyzer: Send + Sync {
    async fn analyze(&self, scene: &SarScene) -> Result<OilSpillFinding, EscalationError>;
}

/// HTTP client for the segmentation+classification service.
pub struct DetectionClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct DetectionResponse {
    #[serde(rename = "Predicted Class")]
    predicted_class: i64,
    #[serde(rename = "SAR_mask", alias = "Annotated_image")]
    annotated_image: String,
}

impl DetectionClient {
    pub fn new(url: &str) -> Result<Self, EscalationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(COLLABORATOR_HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SpillAnalyzer for DetectionClient {
    async fn analyze(&self, scene: &SarScene) -> Result<OilSpillFinding, EscalationError> {
        let body = serde_json::json!({ "image": scene.image_base64 });

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(EscalationError::Analysis(format!(
                "detection service returned HTTP {}",
                response.status()
            )));
        }

        let parsed: DetectionResponse = response.json().await?;
        Ok(OilSpillFinding {
            predicted_class: parsed.predicted_class,
            annotated_image: parsed.annotated_image,
            area_sqkm: scene.area_sqkm,
            sar_image: Some(scene.image_base64.clone()),
            feature_attributions: Vec::new(),
        })
    }
}
