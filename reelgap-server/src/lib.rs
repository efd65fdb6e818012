//! # Reelgap Server
//!
//! HTTP front for the availability resolver. Exposes three endpoints under
//! `/api/v1/mediaserver`:
//!
//! - `GET /play/{item_id}`: web client link for an item on a media server
//! - `GET /exists`: whether a title is already in the library
//! - `POST /notexists`: missing episodes of a series, or the movie sentinel

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;

use axum::{Router, http::HeaderValue, routing::get};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Assemble the application router with CORS and request tracing.
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config()
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    let cors_layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(routes::create_api_router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(state)
}
