//! Health check handlers and response types.

use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub metadata: String,
    pub storage: String,
}

/// Liveness check: the process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Dependency check: the metadata store decides readiness, storage only degrades.
pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    let metadata = state.metadata().clone();
    let metadata_status =
        run_check(CHECK_TIMEOUT, async move { metadata.ping().await }, "unhealthy").await;

    let storage = state.storage().clone();
    let storage_status = run_check(
        CHECK_TIMEOUT,
        async move {
            storage
                .exists("health-check/non-existent/key")
                .await
                .map(drop)
        },
        "degraded",
    )
    .await;

    let healthy = metadata_status == "healthy";
    if !healthy {
        tracing::error!(metadata = %metadata_status, "Health check failed");
    }

    let response = HealthCheckResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        metadata: metadata_status,
        storage: storage_status,
    };
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
