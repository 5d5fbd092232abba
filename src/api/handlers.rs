//! REST handlers for health and operational status.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ServerState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub subscribers: usize,
    pub records_processed: u64,
    pub records_skipped: u64,
    pub anomalies_flagged: u64,
    pub escalations_enqueued: u64,
    pub escalations_rejected: u64,
    pub escalation_tasks_processed: u64,
    pub findings_produced: u64,
    pub escalation_tasks_failed: u64,
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<ServerState>) -> Json<StatusResponse> {
    let ingest = &state.ingest_stats;
    let escalation = &state.escalation_stats;

    Json(StatusResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        subscribers: state.hub.subscriber_count(),
        records_processed: ingest.records_processed.load(Ordering::Relaxed),
        records_skipped: ingest.records_skipped.load(Ordering::Relaxed),
        anomalies_flagged: ingest.anomalies_flagged.load(Ordering::Relaxed),
        escalations_enqueued: ingest.escalations_enqueued.load(Ordering::Relaxed),
        escalations_rejected: state.escalation.rejected_count(),
        escalation_tasks_processed: escalation.tasks_processed.load(Ordering::Relaxed),
        findings_produced: escalation.findings_produced.load(Ordering::Relaxed),
        escalation_tasks_failed: escalation.tasks_failed.load(Ordering::Relaxed),
    })
}
