//! Challenge request/verify orchestration.
//!
//! The engine is the only writer of per-identity state. A request and a
//! verify for the same identity never interleave: both run under that
//! identity's async lock. Different identities use different locks, so
//! unrelated users never serialize on each other. Nothing inside the
//! critical section performs I/O; code delivery happens at the HTTP
//! boundary after the lock is released.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::session::{IssuedSession, TokenSigner};

use super::identity;
use super::rate_limit::RateLimiter;
use super::store::{AttemptOutcome, OtpStore};

/// Limits and lifetimes for challenges and code sends.
#[derive(Clone, Copy, Debug)]
pub struct OtpPolicy {
    pub code_ttl: Duration,
    pub max_attempts: u8,
    pub send_window: Duration,
    pub max_sends: usize,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::minutes(5),
            max_attempts: 3,
            send_window: Duration::minutes(15),
            max_sends: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("identity is not a well-formed email address")]
    InvalidIdentity,
    #[error("too many code requests; retry in {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no pending code for this identity")]
    NoPendingChallenge,
    #[error("code has expired")]
    Expired,
    #[error("no verification attempts remaining")]
    AttemptsExhausted,
    #[error("wrong code, {attempts_left} attempts left")]
    InvalidCode { attempts_left: u8 },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A challenge the caller still has to deliver to the user.
///
/// The engine hands the plaintext code to the delivery boundary exactly
/// once and keeps no copy outside the challenge itself.
#[derive(Clone, Debug)]
pub struct IssuedChallenge {
    pub identity: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// The OTP state machine: rate limiter + challenge store + token issue.
pub struct OtpEngine {
    limiter: RateLimiter,
    store: OtpStore,
    signer: Arc<TokenSigner>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl OtpEngine {
    #[must_use]
    pub fn new(policy: OtpPolicy, signer: Arc<TokenSigner>) -> Self {
        Self {
            limiter: RateLimiter::new(policy.send_window, policy.max_sends),
            store: OtpStore::new(policy.code_ttl, policy.max_attempts),
            signer,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Take the async lock for one identity. The map lock is only held to
    /// fetch or insert the entry, never across an await.
    async fn lock_identity(&self, identity: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock();
            Arc::clone(
                locks
                    .entry(identity.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        entry.lock_owned().await
    }

    /// Create a fresh challenge for `identity`, subject to the send limit.
    ///
    /// The rate window is only charged after the challenge exists, and
    /// both happen under the identity lock, so concurrent requests cannot
    /// slip past the cap or charge a send that produced nothing.
    ///
    /// # Errors
    ///
    /// [`RequestError::InvalidIdentity`] for malformed emails,
    /// [`RequestError::RateLimited`] when the window is full, and
    /// [`RequestError::Internal`] if the random source fails.
    pub async fn request_challenge(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedChallenge, RequestError> {
        let identity = identity::normalize(identity);
        if !identity::is_valid(&identity) {
            return Err(RequestError::InvalidIdentity);
        }

        let _guard = self.lock_identity(&identity).await;

        if !self.limiter.allow(&identity, now) {
            let retry_after = self.limiter.retry_after(&identity, now);
            return Err(RequestError::RateLimited {
                retry_after_seconds: u64::try_from(retry_after.num_seconds())
                    .unwrap_or(0)
                    .max(1),
            });
        }

        let challenge = self.store.create(&identity, now)?;
        self.limiter.record(&identity, now);

        Ok(IssuedChallenge {
            identity,
            code: challenge.code,
            expires_at: challenge.expires_at,
        })
    }

    /// Spend one verification attempt; on a match, issue a session token.
    ///
    /// This is the only path that creates a session.
    ///
    /// # Errors
    ///
    /// One variant per challenge outcome, mapped 1:1 from the store, or
    /// [`VerifyError::Internal`] if token signing fails.
    pub async fn verify(
        &self,
        identity: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, VerifyError> {
        let identity = identity::normalize(identity);

        let outcome = {
            let _guard = self.lock_identity(&identity).await;
            self.store.consume_attempt(&identity, code, now)
        };

        // The challenge is already consumed; signing needs no lock.
        match outcome {
            AttemptOutcome::Verified => Ok(self.signer.issue(&identity, now)?),
            AttemptOutcome::NoPendingChallenge => Err(VerifyError::NoPendingChallenge),
            AttemptOutcome::Expired => Err(VerifyError::Expired),
            AttemptOutcome::Exhausted => Err(VerifyError::AttemptsExhausted),
            AttemptOutcome::Mismatch { attempts_left } => {
                Err(VerifyError::InvalidCode { attempts_left })
            }
        }
    }

    /// Drop expired challenges, aged-out rate windows, and idle identity
    /// locks. Memory hygiene only; every read path re-checks expiry.
    pub fn prune(&self, now: DateTime<Utc>) {
        self.store.prune_expired(now);
        self.limiter.prune(now);
        // An Arc held by a task in flight keeps its entry alive.
        self.locks.lock().retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    pub(crate) fn pending_challenges(&self) -> usize {
        self.store.pending_count()
    }
}

impl std::fmt::Debug for OtpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpEngine")
            .field("limiter", &self.limiter)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
