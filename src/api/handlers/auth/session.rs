//! Session inspection and logout endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;

use super::state::{AuthState, AuthenticateError};
use super::types::{AuthErrorResponse, SessionResponse};
use super::utils::extract_bearer_token;

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Token is valid", body = SessionResponse),
        (status = 401, description = "Missing, malformed, expired, or revoked token", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse::new(
                "missing_token",
                "Authorization bearer token required",
            )),
        )
            .into_response();
    };

    match auth_state.authenticate(&token, Utc::now()) {
        Ok(claims) => (
            StatusCode::OK,
            Json(SessionResponse {
                email: claims.sub,
                expires_at: claims.exp,
            }),
        )
            .into_response(),
        Err(err) => (StatusCode::UNAUTHORIZED, Json(unauthorized_body(&err))).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Token revoked; always succeeds")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Revoking an absent, expired, or already-revoked token is a no-op.
    if let Some(token) = extract_bearer_token(&headers) {
        auth_state.logout(&token, Utc::now());
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Resolve the bearer header into session claims for protected handlers.
///
/// Returns a ready-to-send 401 response when the request carries no
/// usable token.
pub(crate) fn authenticate_request(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<crate::session::SessionClaims, axum::response::Response> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse::new(
                "missing_token",
                "Authorization bearer token required",
            )),
        )
            .into_response());
    };
    auth_state
        .authenticate(&token, Utc::now())
        .map_err(|err| (StatusCode::UNAUTHORIZED, Json(unauthorized_body(&err))).into_response())
}

pub(crate) fn unauthorized_body(err: &AuthenticateError) -> AuthErrorResponse {
    match err {
        AuthenticateError::Malformed => {
            AuthErrorResponse::new("malformed", "Token could not be verified")
        }
        AuthenticateError::Expired => {
            AuthErrorResponse::new("token_expired", "Session has expired")
        }
        AuthenticateError::Revoked => {
            AuthErrorResponse::new("revoked", "Session was logged out")
        }
    }
}
