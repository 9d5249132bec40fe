//! Keyed store of pending challenges, one per identity.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::code::{codes_match, generate_code};
use super::models::Challenge;

/// Outcome of consuming one verification attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Supplied code matched; the challenge has been removed.
    Verified,
    /// No challenge exists for the identity.
    NoPendingChallenge,
    /// The challenge had passed its deadline and has been removed.
    Expired,
    /// The challenge had no attempts left and has been removed.
    Exhausted,
    /// Wrong code; `attempts_left` is what remains after this attempt.
    /// At zero the challenge has been removed.
    Mismatch { attempts_left: u8 },
}

/// In-memory challenge store. Expiry is lazy: every read re-checks the
/// deadline against the supplied clock, so the background sweep is never
/// needed for correctness.
#[derive(Debug)]
pub struct OtpStore {
    code_ttl: Duration,
    max_attempts: u8,
    entries: Mutex<HashMap<String, Challenge>>,
}

impl OtpStore {
    #[must_use]
    pub fn new(code_ttl: Duration, max_attempts: u8) -> Self {
        Self {
            code_ttl,
            max_attempts,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a fresh challenge for `identity`, replacing any prior one.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS random source fails to produce a code.
    pub fn create(&self, identity: &str, now: DateTime<Utc>) -> Result<Challenge> {
        let challenge = Challenge {
            code: generate_code().context("failed to generate one-time code")?,
            created_at: now,
            expires_at: now + self.code_ttl,
            attempts_remaining: self.max_attempts,
        };
        self.entries
            .lock()
            .insert(identity.to_string(), challenge.clone());
        Ok(challenge)
    }

    /// Look at the pending challenge without consuming an attempt.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<Challenge> {
        self.entries.lock().get(identity).cloned()
    }

    /// Spend one verification attempt for `identity`.
    ///
    /// Decision order: missing, expired, exhausted, then a constant-time
    /// code comparison. A challenge that expires, runs out of attempts,
    /// or verifies is removed, so the next attempt for the identity
    /// reports `NoPendingChallenge`.
    pub fn consume_attempt(
        &self,
        identity: &str,
        supplied_code: &str,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        let mut entries = self.entries.lock();
        let Some(challenge) = entries.get_mut(identity) else {
            return AttemptOutcome::NoPendingChallenge;
        };

        if challenge.is_expired(now) {
            entries.remove(identity);
            return AttemptOutcome::Expired;
        }

        if challenge.attempts_remaining == 0 {
            entries.remove(identity);
            return AttemptOutcome::Exhausted;
        }

        if codes_match(supplied_code, &challenge.code) {
            entries.remove(identity);
            return AttemptOutcome::Verified;
        }

        challenge.attempts_remaining -= 1;
        let attempts_left = challenge.attempts_remaining;
        if attempts_left == 0 {
            entries.remove(identity);
        }
        AttemptOutcome::Mismatch { attempts_left }
    }

    /// Remove the challenge regardless of state.
    pub fn clear(&self, identity: &str) {
        self.entries.lock().remove(identity);
    }

    /// Drop challenges that have passed their deadline.
    pub fn prune_expired(&self, now: DateTime<Utc>) {
        self.entries
            .lock()
            .retain(|_, challenge| !challenge.is_expired(now));
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.entries.lock().len()
    }
}
