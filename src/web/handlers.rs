//! HTTP request handlers

use super::state::AppState;
use crate::cache::CacheStats;
use crate::metrics::MetricsSnapshot;
use crate::orchestrator::OrchestratorState;
use crate::strategy::StrategyKind;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Forced strategy name, e.g. "quick"
    pub strategy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub state: OrchestratorState,
    pub cache_size: usize,
    pub cached_pages: u64,
    pub cache: CacheStats,
    pub metrics: MetricsSnapshot,
}

/// Search handler, always answers with a `SearchResponse`
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();

    let forced = params
        .strategy
        .filter(|s| !s.is_empty())
        .and_then(|s| match s.parse::<StrategyKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!("{}, using automatic selection", e);
                None
            }
        });

    let response = state.orchestrator.search(&query, forced, None).await;
    Json(response)
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    Json(StatsResponse {
        state: orchestrator.state(),
        cache_size: orchestrator.cache_size(),
        cached_pages: orchestrator.cached_pages(),
        cache: orchestrator.cache_stats(),
        metrics: orchestrator.metrics().snapshot(),
    })
}

pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.orchestrator.clear_cache();
    StatusCode::NO_CONTENT
}

/// Drop one query's cached responses
pub async fn forget_query(State(state): State<AppState>, Query(params): Query<SearchParams>) -> impl IntoResponse {
    match params.q.filter(|q| !q.trim().is_empty()) {
        Some(query) => {
            state.orchestrator.forget(&query);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::BAD_REQUEST,
    }
}

pub async fn reset_stats(State(state): State<AppState>) -> impl IntoResponse {
    state.orchestrator.reset_monthly_stats();
    StatusCode::NO_CONTENT
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "providers": state.orchestrator.registry().names(),
    }))
}
