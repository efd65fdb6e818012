use axum::{
    Json,
    extract::{Path, Query, State},
};
use reelgap_model::{
    ItemId,
    api::{
        ApiResponse, ExistsParams, ExistsResponse, MediaInfoRequest, NotExistEntry,
        PlayUrlResponse,
    },
};
use serde::Deserialize;
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct PlayQuery {
    /// Media server to link to; the first configured server when absent.
    #[serde(default)]
    pub server: Option<String>,
}

/// GET /api/v1/mediaserver/play/{item_id} - Web client link for an item
pub async fn play_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Query(query): Query<PlayQuery>,
) -> AppResult<Json<ApiResponse<PlayUrlResponse>>> {
    let item_id = ItemId::from(item_id);
    let url = match query.server.as_deref().filter(|s| !s.is_empty()) {
        Some(server) => state
            .service()
            .play_url_on(server, &item_id)
            .ok_or_else(|| AppError::not_found(format!("Unknown media server '{server}'")))?,
        None => state
            .service()
            .play_url(&item_id)
            .ok_or_else(|| AppError::not_found("No media server configured"))?,
    };

    debug!(item_id = %item_id, url = %url, "play link built");
    Ok(Json(ApiResponse::success(PlayUrlResponse { url })))
}

/// GET /api/v1/mediaserver/exists - Whether a title is already in the library
pub async fn exists_handler(
    State(state): State<AppState>,
    Query(params): Query<ExistsParams>,
) -> AppResult<Json<ApiResponse<ExistsResponse>>> {
    let response = state.service().exists(&params).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// POST /api/v1/mediaserver/notexists - Missing episodes, or the movie sentinel
pub async fn not_exists_handler(
    State(state): State<AppState>,
    Json(request): Json<MediaInfoRequest>,
) -> AppResult<Json<Vec<NotExistEntry>>> {
    let availability = state.service().missing(&request).await?;
    Ok(Json((&availability).into()))
}
