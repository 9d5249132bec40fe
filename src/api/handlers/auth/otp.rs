//! Code request and verification endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::email::OtpEmail;
use crate::otp::{RequestError, VerifyError};

use super::state::AuthState;
use super::types::{
    AuthErrorResponse, OtpRequestPayload, OtpRequestResponse, OtpVerifyPayload, OtpVerifyResponse,
};

#[utoipa::path(
    post,
    path = "/v1/auth/otp/request",
    request_body = OtpRequestPayload,
    responses(
        (status = 200, description = "Code generated and handed to delivery", body = OtpRequestResponse),
        (status = 400, description = "Malformed email", body = AuthErrorResponse),
        (status = 429, description = "Send limit reached; Retry-After set", body = AuthErrorResponse),
        (status = 502, description = "Delivery failed; the code stays valid", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
pub async fn request_code(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<OtpRequestPayload>>,
) -> impl IntoResponse {
    let request: OtpRequestPayload = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AuthErrorResponse::new("missing_payload", "Missing payload")),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    let issued = match auth_state.engine().request_challenge(&request.email, now).await {
        Ok(issued) => issued,
        Err(RequestError::InvalidIdentity) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AuthErrorResponse::new(
                    "invalid_email",
                    "Not a valid email address",
                )),
            )
                .into_response();
        }
        Err(RequestError::RateLimited {
            retry_after_seconds,
        }) => {
            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                headers.insert(RETRY_AFTER, value);
            }
            return (
                StatusCode::TOO_MANY_REQUESTS,
                headers,
                Json(
                    AuthErrorResponse::new(
                        "rate_limited",
                        "Too many code requests for this address",
                    )
                    .with_retry_after(retry_after_seconds),
                ),
            )
                .into_response();
        }
        Err(RequestError::Internal(err)) => {
            error!("Failed to create challenge: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AuthErrorResponse::new(
                    "internal",
                    "Could not generate a code",
                )),
            )
                .into_response();
        }
    };

    let expires_in_seconds =
        u64::try_from((issued.expires_at - now).num_seconds()).unwrap_or_default();

    // Delivery happens outside the engine; a failed send keeps the
    // challenge alive, so a retry reuses the still-valid code.
    let message = OtpEmail {
        to_email: issued.identity.clone(),
        code: issued.code.clone(),
        expires_in_seconds,
    };
    if let Err(err) = auth_state.mailer().send(&message) {
        warn!(to_email = %issued.identity, "otp delivery failed: {err}");
        return (
            StatusCode::BAD_GATEWAY,
            Json(AuthErrorResponse::new(
                "delivery_failed",
                "Could not deliver the code; request again shortly",
            )),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(OtpRequestResponse {
            message: "Code sent".to_string(),
            expires_in_seconds,
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/otp/verify",
    request_body = OtpVerifyPayload,
    responses(
        (status = 200, description = "Code accepted; session token issued", body = OtpVerifyResponse),
        (status = 401, description = "Wrong code", body = AuthErrorResponse),
        (status = 404, description = "No pending code for this address", body = AuthErrorResponse),
        (status = 410, description = "Code expired", body = AuthErrorResponse),
        (status = 429, description = "Attempts exhausted", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_code(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<OtpVerifyPayload>>,
) -> impl IntoResponse {
    let request: OtpVerifyPayload = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AuthErrorResponse::new("missing_payload", "Missing payload")),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    match auth_state
        .engine()
        .verify(&request.email, request.code.trim(), now)
        .await
    {
        Ok(session) => {
            let expires_in_seconds =
                u64::try_from(session.claims.exp - session.claims.iat).unwrap_or_default();
            (
                StatusCode::OK,
                Json(OtpVerifyResponse {
                    access_token: session.token,
                    token_type: "bearer".to_string(),
                    expires_in_seconds,
                }),
            )
                .into_response()
        }
        Err(VerifyError::NoPendingChallenge) => (
            StatusCode::NOT_FOUND,
            Json(AuthErrorResponse::new(
                "no_pending_code",
                "No code was requested for this address",
            )),
        )
            .into_response(),
        Err(VerifyError::Expired) => (
            StatusCode::GONE,
            Json(AuthErrorResponse::new(
                "code_expired",
                "The code has expired; request a new one",
            )),
        )
            .into_response(),
        Err(VerifyError::AttemptsExhausted) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(AuthErrorResponse::new(
                "attempts_exhausted",
                "Too many failed attempts; request a new code",
            )),
        )
            .into_response(),
        Err(VerifyError::InvalidCode { attempts_left }) => (
            StatusCode::UNAUTHORIZED,
            Json(
                AuthErrorResponse::new("invalid_code", "Wrong code")
                    .with_attempts_left(attempts_left),
            ),
        )
            .into_response(),
        Err(VerifyError::Internal(err)) => {
            error!("Failed to issue session token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AuthErrorResponse::new(
                    "internal",
                    "Could not issue a session token",
                )),
            )
                .into_response()
        }
    }
}
