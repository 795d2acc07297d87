//! Bearer token authentication

use crate::server::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Static bearer token middleware
///
/// Requests without an `Authorization: Bearer <token>` header matching the
/// configured token are answered with 401 and never reach the handler.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = match bearer_token(request.headers()) {
        Some(token) => token == state.api_token.as_ref(),
        None => {
            tracing::debug!("Rejected request without bearer token");
            return Err(ApiError::Unauthorized);
        }
    };

    if !authorized {
        tracing::warn!("Rejected request with invalid bearer token");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Extracts the credentials of a `Bearer` authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token.trim()).filter(|t| !t.is_empty())
}
