// handlers/protected/donations.rs - GET /donations handler

use axum::extract::{Extension, State};

use crate::auth::AdminPrincipal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Donation, DONATIONS};
use crate::state::AppState;

/// GET /donations - Every donation in receipt order, `[]` when there are none.
pub async fn donations_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
) -> ApiResult<Vec<Donation>> {
    let donations: Vec<Donation> = state.store.list_all(DONATIONS).await?;
    tracing::debug!(username = %principal.username, count = donations.len(), "listing donations");
    Ok(ApiResponse::bare(donations))
}
