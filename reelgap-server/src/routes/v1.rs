use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, handlers::mediaserver};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new().nest("/mediaserver", create_mediaserver_routes(state))
}

fn create_mediaserver_routes(_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/play/{item_id}", get(mediaserver::play_handler))
        .route("/exists", get(mediaserver::exists_handler))
        .route("/notexists", post(mediaserver::not_exists_handler))
}
