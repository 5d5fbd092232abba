//! Persistence and notification collaborators.
//!
//! Completed escalations are handed to a document store and, optionally, a
//! push-notification service. Both are black boxes behind traits with
//! HTTP-backed defaults; either can be disabled by leaving its URL
//! unconfigured.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::defaults::COLLABORATOR_HTTP_TIMEOUT_SECS;
use crate::types::{AnomalyVerdict, OilSpillFinding, VesselReport};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Persists one completed (report, verdict, finding) triple.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn persist(
        &self,
        report: &VesselReport,
        verdict: &AnomalyVerdict,
        finding: &OilSpillFinding,
    ) -> Result<(), StoreError>;
}

/// Pushes an operator notification for one confirmed finding.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_spill(&self, mmsi: u64, finding: &OilSpillFinding) -> Result<(), StoreError>;
}

/// HTTP document store, posting the combined report document the dashboard
/// and retrieval tools consume.
pub struct HttpReportStore {
    client: reqwest::Client,
    url: String,
}

impl HttpReportStore {
    pub fn new(url: &str) -> Result<Self, StoreError> {
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
impl ReportStore for HttpReportStore {
    async fn persist(
        &self,
        report: &VesselReport,
        verdict: &AnomalyVerdict,
        finding: &OilSpillFinding,
    ) -> Result<(), StoreError> {
        let document = serde_json::json!({
            "ais_data": report,
            "MMSI": report.mmsi,
            "anomaly_result": verdict,
            "sar_prediction": finding,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let response = self.client.post(&self.url).json(&document).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }
        Ok(())
    }
}

/// HTTP push-notification sender.
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: &str) -> Result<Self, StoreError> {
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
impl Notifier for HttpNotifier {
    async fn notify_spill(&self, mmsi: u64, finding: &OilSpillFinding) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "title": "Possible oil spill detected",
            "body": format!(
                "Vessel {mmsi}: predicted class {}, estimated area {:.2} km²",
                finding.predicted_class, finding.area_sqkm
            ),
            "mmsi": mmsi,
        });

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }
        Ok(())
    }
}
