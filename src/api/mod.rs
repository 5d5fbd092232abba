//! Client-facing HTTP/WebSocket API using Axum.
//!
//! - `GET /health` — liveness probe
//! - `GET /api/v1/status` — uptime, subscriber count, pipeline counters
//! - `GET /ws` — persistent stream of JSON-encoded pipeline events

pub mod handlers;
mod routes;
mod ws;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::escalation::EscalationSender;
use crate::hub::BroadcastHub;
use crate::pipeline::IngestStats;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ServerState {
    pub hub: Arc<BroadcastHub>,
    pub ingest_stats: Arc<IngestStats>,
    pub escalation_stats: Arc<crate::escalation::EscalationStats>,
    pub escalation: EscalationSender,
    pub started_at: Instant,
}

/// Create the complete application router.
pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .merge(routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
