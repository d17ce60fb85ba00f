//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handlers::search))
        .route("/stats", get(handlers::stats))
        .route("/stats/reset", post(handlers::reset_stats))
        .route("/cache", delete(handlers::forget_query))
        .route("/cache/clear", post(handlers::clear_cache))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{BillingProfile, Orchestrator};
    use crate::providers::ProviderRegistry;
    use crate::results::SearchResponse;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let orchestrator = Orchestrator::new(ProviderRegistry::new(), BillingProfile::default());
        create_router(AppState::new(orchestrator))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_without_providers_degrades() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/search?q=rust&strategy=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert!(parsed.results.is_empty());
        assert!(parsed.degraded);
        assert_eq!(parsed.cost_usd, 0.0);
    }

    #[tokio::test]
    async fn test_reset_and_clear() {
        for uri in ["/stats/reset", "/cache/clear"] {
            let response = app()
                .oneshot(Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
    }

    #[tokio::test]
    async fn test_forget_query() {
        let request = |uri: &str| Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap();

        let response = app().oneshot(request("/cache?q=rust")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app().oneshot(request("/cache")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats() {
        let response = app()
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats["tier"], "free");
        assert_eq!(stats["monthly_search_count"], 0);
        assert_eq!(stats["cached_pages"], 0);
    }
}
