//! Auth configuration and shared state.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;

use crate::api::email::OtpSender;
use crate::otp::{OtpEngine, OtpPolicy};
use crate::session::{RevocationList, SessionClaims, TokenSigner};

const DEFAULT_CODE_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_CODE_MAX_ATTEMPTS: u8 = 3;
const DEFAULT_SEND_WINDOW_SECONDS: i64 = 15 * 60;
const DEFAULT_SEND_MAX: usize = 3;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    code_ttl_seconds: i64,
    code_max_attempts: u8,
    send_window_seconds: i64,
    send_max: usize,
    session_ttl_seconds: i64,
    sweep_interval_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            code_max_attempts: DEFAULT_CODE_MAX_ATTEMPTS,
            send_window_seconds: DEFAULT_SEND_WINDOW_SECONDS,
            send_max: DEFAULT_SEND_MAX,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_max_attempts(mut self, attempts: u8) -> Self {
        self.code_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_send_window_seconds(mut self, seconds: i64) -> Self {
        self.send_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_send_max(mut self, sends: usize) -> Self {
        self.send_max = sends;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn sweep_interval_seconds(&self) -> u64 {
        self.sweep_interval_seconds
    }

    fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            code_ttl: Duration::seconds(self.code_ttl_seconds),
            max_attempts: self.code_max_attempts,
            send_window: Duration::seconds(self.send_window_seconds),
            max_sends: self.send_max,
        }
    }
}

/// Why a presented token was not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthenticateError {
    #[error("token is malformed or its signature does not verify")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
}

/// Everything the auth handlers share: engine, signer, revocations,
/// mailer, and the knobs they were built from.
pub struct AuthState {
    config: AuthConfig,
    engine: OtpEngine,
    signer: Arc<TokenSigner>,
    revocations: RevocationList,
    mailer: Arc<dyn OtpSender>,
}

impl AuthState {
    /// # Errors
    ///
    /// Returns an error if the signing secret is unusable; startup must
    /// abort rather than run with forgeable tokens.
    pub fn new(
        config: AuthConfig,
        token_secret: &SecretString,
        mailer: Arc<dyn OtpSender>,
    ) -> Result<Self> {
        let signer = Arc::new(
            TokenSigner::new(
                token_secret,
                Duration::seconds(config.session_ttl_seconds),
            )
            .context("invalid token signing secret")?,
        );
        let engine = OtpEngine::new(config.otp_policy(), Arc::clone(&signer));
        Ok(Self {
            config,
            engine,
            signer,
            revocations: RevocationList::new(),
            mailer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> &OtpEngine {
        &self.engine
    }

    pub(crate) fn mailer(&self) -> &dyn OtpSender {
        self.mailer.as_ref()
    }

    /// Validate a bearer token and check it against the revocation set.
    ///
    /// # Errors
    ///
    /// `Malformed` when the token cannot be parsed or its signature does
    /// not verify, `Expired` past the embedded deadline, `Revoked` when
    /// the token id was logged out before its natural expiry.
    pub fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, AuthenticateError> {
        let claims = self.signer.validate(token, now).map_err(|err| {
            if err.is_malformed() {
                AuthenticateError::Malformed
            } else {
                AuthenticateError::Expired
            }
        })?;

        if self.revocations.is_revoked(claims.jti) {
            return Err(AuthenticateError::Revoked);
        }

        Ok(claims)
    }

    /// Revoke a token. Idempotent: revoking an already-revoked, expired,
    /// or unparseable token is a no-op, never an error.
    pub fn logout(&self, token: &str, now: DateTime<Utc>) {
        if let Ok(claims) = self.signer.validate(token, now) {
            self.revocations.revoke(claims.jti, claims.expires_at());
        }
    }

    /// Prune expired challenges, rate windows, and revocation entries.
    pub fn prune_expired(&self, now: DateTime<Utc>) {
        self.engine.prune(now);
        self.revocations.prune_expired(now);
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
