//! SAR imagery acquisition collaborator.
//!
//! The imagery service owns the Earth-Engine side of the pipeline — scene
//! search, despeckling, thresholding, area estimation — and hands back a
//! processed scene. This module only speaks its HTTP contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};

use super::EscalationError;
use crate::config::defaults::{COLLABORATOR_HTTP_TIMEOUT_SECS, SAR_LOOKBACK_DAYS};

/// A processed SAR scene for one coordinate and date window.
#[derive(Debug, Clone)]
pub struct SarScene {
    /// Base64-encoded grayscale PNG of the despeckled scene.
    pub image_base64: String,
    /// Thresholded dark-patch area estimate, km².
    pub area_sqkm: f64,
}

/// Fetches the most recent usable SAR scene around a position.
///
/// `Ok(None)` means no scene covered the window — a normal outcome, not an
/// error; the escalated task simply yields no finding.
#[async_trait]
pub trait ImageryProvider: Send + Sync {
    async fn fetch_scene(
        &self,
        latitude: f64,
        longitude: f64,
        end_date: NaiveDate,
    ) -> Result<Option<SarScene>, EscalationError>;
}

/// HTTP client for the Sentinel-1 imagery service.
pub struct SarImageryClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct ImageryResponse {
    status: Option<String>,
    base64_image: Option<String>,
    oil_area_sqkm: Option<f64>,
    error: Option<String>,
}

impl SarImageryClient {
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
impl ImageryProvider for SarImageryClient {
    async fn fetch_scene(
        &self,
        latitude: f64,
        longitude: f64,
        end_date: NaiveDate,
    ) -> Result<Option<SarScene>, EscalationError> {
        let start_date = end_date
            .checked_sub_days(Days::new(SAR_LOOKBACK_DAYS.unsigned_abs()))
            .unwrap_or(end_date);

        debug!(
            latitude,
            longitude,
            start = %start_date,
            end = %end_date,
            "Requesting SAR scene"
        );

        let body = serde_json::json!({
            "coordinates": [longitude, latitude],
            "start_date": start_date.format("%Y-%m-%d").to_string(),
            "end_date": end_date.format("%Y-%m-%d").to_string(),
        });

        let response = self.client.post(&self.url).json(&body).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(EscalationError::Imagery(format!(
                "imagery service returned HTTP {}",
                response.status()
            )));
        }

        let parsed: ImageryResponse = response.json().await?;
        if let Some(error) = parsed.error {
            // The service reports "no scene in window" through this field.
            info!(latitude, longitude, error, "No SAR scene available");
            return Ok(None);
        }
        if parsed.status.as_deref() != Some("success") {
            return Ok(None);
        }

        Ok(parsed.base64_image.map(|image_base64| SarScene {
            image_base64,
            area_sqkm: parsed.oil_area_sqkm.unwrap_or(0.0),
        }))
    }
}
