pub mod auth;
pub mod routes;

use crate::state::RelayState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use common::api::paths;
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the API router
pub fn router(state: RelayState) -> Router {
    let protected = Router::new()
        .route(paths::ANALYZE_FACE, post(routes::analyze_face))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route(paths::HEALTH, get(routes::health))
        .route(paths::CONFIG, get(routes::config))
        .route(paths::LOGIN, post(routes::login))
        .route(paths::METRICS, get(routes::metrics))
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.max_body_bytes()))
        .layer(middleware::from_fn(telemetry::trace_http_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API router plus, optionally, static files for a browser client
pub fn app(state: RelayState, static_dir: Option<&Path>) -> Router {
    let api = router(state);
    match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => api,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyzer::Analyzer,
        face_service::mock::MockFaceService,
        session::{SessionGate, SessionStore},
    };
    use axum_test::TestServer;
    use common::api::DEFAULT_MAX_BODY_BYTES;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn state() -> RelayState {
        let gate = SessionGate::new("pw", Arc::new(SessionStore::new()));
        let analyzer = Analyzer::new(Arc::new(MockFaceService::new()), "c", 80.0);
        RelayState::new(gate, analyzer, 2.0, DEFAULT_MAX_BODY_BYTES)
    }

    #[tokio::test]
    async fn test_static_client_served_beside_api() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>capture</h1>").unwrap();

        let server = TestServer::new(app(state(), Some(dir.path()))).unwrap();

        let index = server.get("/").await;
        assert_eq!(index.status_code(), 200);
        assert!(index.text().contains("capture"));

        let config = server.get(paths::CONFIG).await;
        assert_eq!(config.json::<Value>(), json!({ "captureIntervalSeconds": 2.0 }));
    }

    #[tokio::test]
    async fn test_unknown_route_without_static_dir() {
        let server = TestServer::new(app(state(), None)).unwrap();
        assert_eq!(server.get("/index.html").await.status_code(), 404);
    }

    #[tokio::test]
    async fn test_responses_carry_correlation_id() {
        let server = TestServer::new(router(state())).unwrap();

        let response = server.get(paths::HEALTH).await;
        assert!(response
            .headers()
            .contains_key(telemetry::X_CORRELATION_ID));
    }
}
