// handlers/public/login.rs - POST /admin/login handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::LoginRequest;
use crate::state::AppState;

/// POST /admin/login - Exchange the admin credential for a signed token
///
/// Expected Input:
/// ```json
/// { "username": "admin", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// A wrong username answers 401 "Invalid username", a wrong password 401
/// "Invalid password". The token is valid for `JWT_EXPIRY_HOURS` (8 by default)
/// and goes verbatim into the `Authorization` header of protected calls.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(payload) = payload?;
    let (username, password) = payload.credentials();

    let token = state.tokens.login(&username, &password).await?;
    Ok(ApiResponse::success("token", token))
}
