//! Self-describing session tokens (HS256 JWT).
//!
//! A token carries its own identity and expiry, so validation needs no
//! server-side lookup; only revocation does (see
//! [`super::revocation::RevocationList`]).

use anyhow::{Result, anyhow};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted signing secret length in bytes.
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionTokenHeader {
    alg: String,
    typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Normalized email the session belongs to.
    pub sub: String,
    /// Unique token id, the key for revocation.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Every failure other than a clean expiry means the token cannot be
    /// trusted at all.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Expired)
    }
}

/// A freshly issued token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Signs and validates session tokens with a process-wide secret.
///
/// The secret is read once at startup and never rotated at runtime.
pub struct TokenSigner {
    key: Vec<u8>,
    session_ttl: Duration,
}

impl TokenSigner {
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than 32 bytes; a weak
    /// key must abort startup rather than issue forgeable tokens.
    pub fn new(secret: &SecretString, session_ttl: Duration) -> Result<Self> {
        let key = secret.expose_secret().as_bytes().to_vec();
        if key.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "token secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                key.len()
            ));
        }
        Ok(Self { key, session_ttl })
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Mint a signed token for `identity`, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if claims serialization or MAC setup fails.
    pub fn issue(&self, identity: &str, now: DateTime<Utc>) -> Result<IssuedSession> {
        let claims = SessionClaims {
            sub: identity.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };

        let header_b64 = b64e_json(&SessionTokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| anyhow!("invalid HMAC key length"))?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let sig_b64 = Base64UrlUnpadded::encode_string(&signature);

        Ok(IssuedSession {
            token: format!("{signing_input}.{sig_b64}"),
            claims,
        })
    }

    /// Check signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] when `now` is past the embedded
    /// deadline, and a malformed-class error for anything else: bad
    /// structure, bad encoding, unexpected algorithm, or a signature
    /// that does not verify (any bit flip lands here).
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::TokenFormat);
        };

        let header: SessionTokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::InvalidSignature)?;
        mac.update(signing_input.as_bytes());
        // verify_slice is constant-time.
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"***")
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}
