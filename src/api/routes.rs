//! API route definitions.

use axum::routing::get;
use axum::Router;

use super::{handlers, ws, ServerState};

/// All routes: liveness, status, and the event stream.
pub fn api_routes(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/v1/status", get(handlers::get_status))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::{escalation_queue_with, EscalationStats};
    use crate::hub::BroadcastHub;
    use crate::pipeline::IngestStats;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> ServerState {
        let (escalation, _rx) = escalation_queue_with(4);
        ServerState {
            hub: Arc::new(BroadcastHub::new()),
            ingest_stats: Arc::new(IngestStats::default()),
            escalation_stats: Arc::new(EscalationStats::default()),
            escalation,
            started_at: std::time::Instant::now(),
        }
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_route() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ws_route_requires_upgrade() {
        let app = api_routes(create_test_state());

        // A plain GET without the upgrade headers is rejected, which
        // confirms the route exists and is wired to the WS handler.
        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::NOT_FOUND);
        assert_ne!(response.status(), StatusCode::OK);
    }
}
