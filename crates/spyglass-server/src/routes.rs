//! Route configuration for the dashboard API.

use std::sync::Arc;

use axum::routing::{get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, list_kinds, watch_events};
use crate::state::DashboardState;

/// Create the dashboard API router.
pub fn create_router(state: Arc<DashboardState>) -> Router {
    let cors = build_cors_layer(state.config());

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Watchable kinds
        .route("/kinds", get(list_kinds))
        // Aggregated SSE watch stream
        .route("/watch", get(watch_events));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &crate::config::DashboardConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use spyglass_watch::{
        FixedSubscriber, KindRegistry, KindSpec, Subscriber, WatchHub, WatchScheduler,
    };
    use tower::ServiceExt;

    fn make_test_state(config: DashboardConfig) -> Arc<DashboardState> {
        let kinds = KindRegistry::new()
            .register(KindSpec::new(
                "ConfigMap",
                Arc::new(|| {
                    Ok(Box::new(FixedSubscriber::items(vec![json!({"name": "cm"})]))
                        as Box<dyn Subscriber>)
                }),
            ))
            .into_watchables();
        let hub = Arc::new(WatchHub::new(Arc::new(WatchScheduler::new()), kinds));
        Arc::new(DashboardState::new(config, hub))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(make_test_state(DashboardConfig::default()));

        let response = app.oneshot(get_request("/api/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_kinds_endpoint() {
        let app = create_router(make_test_state(DashboardConfig::default()));

        let response = app.oneshot(get_request("/api/kinds")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();

        assert_eq!(json.len(), 1);
        assert_eq!(json[0]["name"], "ConfigMap");
    }

    #[tokio::test]
    async fn test_watch_endpoint_is_server_sent_events() {
        let app = create_router(make_test_state(DashboardConfig::default()));

        let response = app.oneshot(get_request("/api/watch")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_watch_endpoint_enforces_connection_limit() {
        let config = DashboardConfig::default().with_max_watch_connections(1);
        let state = make_test_state(config);
        let app = create_router(state);

        let first = app.clone().oneshot(get_request("/api/watch")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(get_request("/api/watch")).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);

        // Disconnecting the first client frees the slot.
        drop(first);
        let third = app.oneshot(get_request("/api/watch")).await.unwrap();
        assert_eq!(third.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_watch_endpoint_after_shutdown() {
        let state = make_test_state(DashboardConfig::default());
        state.hub().shutdown().await;
        let app = create_router(state);

        let response = app.oneshot(get_request("/api/watch")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let app = create_router(make_test_state(DashboardConfig::default()));

        let response = app.oneshot(get_request("/api/unknown")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_any_origin() {
        let app = create_router(make_test_state(DashboardConfig::default()));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/health")
            .header("Origin", "http://example.com")
            .header("Access-Control-Request-Method", "GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert!(response.status().is_success() || response.status() == StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_cors_specific_origins() {
        let config = DashboardConfig::default().with_cors_origin("http://localhost:3000");
        let _app = create_router(make_test_state(config));

        // Router created successfully with specific CORS origins
    }
}
