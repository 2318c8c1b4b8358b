//! Route configuration and setup.

mod health;

use crate::auth::middleware::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use filedrive_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart framing or JSON field names around the file content.
const BODY_FRAMING_ALLOWANCE: usize = 64 * 1024;

/// Largest accepted request body: a max-size file after base64 expansion plus framing.
pub fn request_body_limit(max_file_size_bytes: usize) -> usize {
    max_file_size_bytes
        .saturating_add(2)
        .saturating_div(3)
        .saturating_mul(4)
        .saturating_add(BODY_FRAMING_ALLOWANCE)
}

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        verifier: state.verifier.clone(),
    });

    let protected_routes = protected_routes(state.clone())
        .layer(axum::middleware::from_fn_with_state(auth_state, auth_middleware));

    let body_limit = request_body_limit(config.max_file_size_bytes());
    tracing::info!(body_limit_bytes = body_limit, "Request body limit configured");

    let app = public_routes(state.clone())
        .merge(protected_routes)
        .with_state(state)
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", post(handlers::auth::authenticate))
        .route("/storage/{*key}", get(handlers::storage::download_signed))
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { health::health_check(state).await }
                }
            }),
        )
        .route("/live", get(health::liveness_check))
        .with_state(state)
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/files",
            post(handlers::files::upload_file).get(handlers::files::list_files),
        )
        .route(
            "/files/{file_id}",
            get(handlers::files::get_file).delete(handlers::files::delete_file),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_base64_expansion() {
        let max = 3 * 1024 * 1024;
        assert_eq!(request_body_limit(max), 4 * 1024 * 1024 + BODY_FRAMING_ALLOWANCE);
        assert_eq!(request_body_limit(1), 4 + BODY_FRAMING_ALLOWANCE);
        assert_eq!(request_body_limit(usize::MAX), usize::MAX);
    }
}
