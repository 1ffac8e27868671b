pub mod api;

use std::sync::Arc;

use axum::{Router, routing::get};
use http::{Method, header::CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Build the CORS layer from the configured origin list.
///
/// `"*"` allows any origin; otherwise a comma-separated list of origins is
/// allowed. With nothing configured only same-origin requests succeed.
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    match origins {
        Some("*") => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(false),
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(methods)
                .allow_headers([CONTENT_TYPE])
        }
        None => {
            info!(
                "CORS not configured, defaulting to same-origin only. \
                 Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
            );
            CorsLayer::new()
                .allow_methods(methods)
                .allow_headers([CONTENT_TYPE])
        }
    }
}

/// Assemble the full application: public health check plus the API routes.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_allowed_origins.as_deref());

    let public_routes = Router::new().route("/", get(handlers::api::health_check));

    public_routes
        .merge(api::create_api_router())
        .with_state(state)
        .layer(cors)
}
