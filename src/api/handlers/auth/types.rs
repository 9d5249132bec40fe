//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpRequestPayload {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpRequestResponse {
    pub message: String,
    pub expires_in_seconds: u64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpVerifyPayload {
    pub email: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpVerifyResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in_seconds: u64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub email: String,
    /// Unix timestamp the session token stops being accepted.
    pub expires_at: i64,
}

/// Error body for every auth endpoint. `error` is a stable
/// machine-readable kind so each engine outcome stays distinguishable
/// on the wire.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<u8>,
}

impl AuthErrorResponse {
    #[must_use]
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            retry_after_seconds: None,
            attempts_left: None,
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_attempts_left(mut self, attempts: u8) -> Self {
        self.attempts_left = Some(attempts);
        self
    }
}
