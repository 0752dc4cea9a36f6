//! HTTP routes for the dashboard.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::handlers;
use crate::errors::{ServiceError, ServiceResult};
use crate::state::AppState;

/// CORS policy: a single configured origin, or any origin when unset.
pub fn cors_layer(allowed_origin: Option<&str>) -> ServiceResult<CorsLayer> {
    let origin = match allowed_origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin.trim()).map_err(|e| {
                ServiceError::Configuration(format!("Invalid CORS_ALLOWED_ORIGIN '{origin}': {e}"))
            })?;
            AllowOrigin::exact(value)
        }
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60)))
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/hello/:name", get(handlers::say_hello))
        .route("/sankey-data", post(handlers::sankey_data))
        .route("/sankey-data/", post(handlers::sankey_data))
        .route("/sankey-data/breakdown", post(handlers::sankey_breakdown))
        .route("/health/ready", get(handlers::readiness))
        .layer(cors)
        .with_state(state)
}
