use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    let servers: Vec<&str> = config
        .media_servers
        .servers
        .iter()
        .map(|s| s.name.as_str())
        .collect();

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "media_servers": servers,
            "local_index": if config.database.url.is_some() { "postgres" } else { "memory" },
            "catalog_key_configured": config.catalog.tmdb_api_key.is_some(),
        }
    }))
}
