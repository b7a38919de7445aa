use crate::infra::AppState;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::atomic::Ordering;
use tracing::debug;
use watchlist::error::AppError;
use watchlist::search::{SearchParams, SearchQuery};

pub(crate) fn router() -> Router {
    Router::new()
        .route("/search", get(search_endpoint))
        .route("/admin/refresh", post(refresh_endpoint))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready once the listener is bound and a loaded snapshot replaced the empty one.
pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let stats = state.searcher.current_snapshot().stats();
    let ready = state.readiness.load(Ordering::Relaxed) && stats.generation > 0;

    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready", "index": stats })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Scores run on the blocking pool against the snapshot current at request time. The
/// deadline is taken before queueing so pool wait counts against it.
pub(crate) async fn search_endpoint(
    Extension(state): Extension<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let query = SearchQuery::from_params(params)?;
    let snapshot = state.searcher.current_snapshot();
    let evaluator = state.evaluator.clone();
    let deadline = evaluator.deadline();

    tokio::task::spawn_blocking(move || {
        let results = evaluator.evaluate(&query, &snapshot, deadline)?;
        debug!(
            matches = results.len(),
            generation = results.generation,
            "search complete"
        );
        Ok::<_, AppError>(Json(&results).into_response())
    })
    .await?
}

pub(crate) async fn refresh_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.refresh.refresh().await?;
    Ok((StatusCode::OK, Json(stats)))
}
