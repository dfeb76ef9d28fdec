//! Bearer authentication middleware
//!
//! Extracts and verifies the `Authorization: Bearer` header on every task
//! route and makes the verified session id available to handlers as a
//! request extension.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::error::ApiError;

/// The authenticated session attached to a request after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub session_id: String,
}

/// Rejects the request with 401 unless it carries a valid bearer token.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
    {
        Some(token) => token,
        None => return ApiError::Unauthenticated.into_response(),
    };

    let session_id = match state.tokens.verify(token) {
        Ok(session_id) => session_id,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(AuthSession { session_id });

    next.run(request).await
}

fn extract_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}
