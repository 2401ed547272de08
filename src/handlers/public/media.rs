// handlers/public/media.rs - GET /media handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{MediaItem, MEDIA};
use crate::state::AppState;

/// GET /media - Every uploaded item, oldest first. `[]` when nothing was uploaded yet.
pub async fn media_get(State(state): State<AppState>) -> ApiResult<Vec<MediaItem>> {
    let items = state.store.list_all(MEDIA).await?;
    Ok(ApiResponse::bare(items))
}
