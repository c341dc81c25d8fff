//! Prometheus metrics endpoint and HTTP request tracking middleware.
//!
//! Besides request counts and durations, the directory records branch
//! mutations and asset files it failed to remove.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const BRANCH_OPERATIONS_TOTAL: &str = "branch_operations_total";
pub const ASSET_CLEANUP_FAILURES_TOTAL: &str = "asset_cleanup_failures_total";
pub const ACCOUNTS_TOTAL: &str = "accounts_total";

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_counter!(
        BRANCH_OPERATIONS_TOTAL,
        "Branch mutations by operation (create/update/delete)"
    );
    describe_counter!(
        ASSET_CLEANUP_FAILURES_TOTAL,
        "Stored files that could not be removed during cleanup"
    );
    describe_gauge!(ACCOUNTS_TOTAL, "Registered accounts by user type");

    Ok(handle)
}

/// GET /metrics - Prometheus text format, no authentication.
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_gauge_metrics(&state).await;

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Metrics not initialized".to_string(),
        ),
    }
}

async fn update_gauge_metrics(state: &AppState) {
    let counts = sqlx::query_as::<_, (String, i64)>(
        "SELECT user_type, COUNT(*) FROM accounts GROUP BY user_type",
    )
    .fetch_all(&state.db)
    .await;

    if let Ok(counts) = counts {
        for (user_type, count) in counts {
            gauge!(ACCOUNTS_TOTAL, "user_type" => user_type).set(count as f64);
        }
    }
}

/// Records `http_requests_total` and `http_request_duration_seconds`,
/// labelled by the matched route template rather than the raw path.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path)
        .record(duration);

    response
}

pub fn record_branch_operation(operation: &'static str) {
    counter!(BRANCH_OPERATIONS_TOTAL, "operation" => operation).increment(1);
}

pub fn record_asset_cleanup_failure() {
    counter!(ASSET_CLEANUP_FAILURES_TOTAL).increment(1);
}
