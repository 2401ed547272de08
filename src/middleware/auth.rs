use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::state::AppState;

/// Token authentication middleware: rejects the request before the handler
/// runs unless the Authorization header carries a valid admin token.
///
/// On success the [`crate::auth::AdminPrincipal`] is placed in the request
/// extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_headers(&headers)?;

    let principal = state.tokens.verify(token).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), "rejected request with invalid token");
        ApiError::from(e)
    })?;

    tracing::debug!(username = %principal.username, path = %request.uri().path(), "token accepted");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Raw token from the Authorization header. A `Bearer ` prefix is tolerated.
fn extract_token_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Authorization header is not valid UTF-8".to_string()))?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
