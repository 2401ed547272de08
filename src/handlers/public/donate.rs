// handlers/public/donate.rs - POST /donate handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use chrono::Utc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{DonatePayload, Donation, NewDonation, DONATIONS};
use crate::state::AppState;

/// POST /donate - Record a donation
///
/// Expected Input:
/// ```json
/// { "name": "Ada", "amount": 25 }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "donation": { "name": "Ada", "amount": 25, "date": "2024-05-01T12:00:00.000Z" }
/// }
/// ```
///
/// Returns 400 when either field is missing or blank; nothing is stored then.
pub async fn donate_post(
    State(state): State<AppState>,
    payload: Result<Json<DonatePayload>, JsonRejection>,
) -> ApiResult<Donation> {
    let Json(payload) = payload?;
    let donation = NewDonation::try_from(payload)?.received_at(Utc::now());

    let donation = state.store.append(DONATIONS, donation).await?;
    tracing::info!(name = %donation.name, "donation received");

    Ok(ApiResponse::success("donation", donation))
}
