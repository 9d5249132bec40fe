//! Pending challenge state for one identity.

use chrono::{DateTime, Utc};

/// A pending one-time code for a single identity.
///
/// Keyed by normalized email in [`super::store::OtpStore`]; at most one
/// exists per identity. Removed on successful verification, expiry, or
/// replacement by a newer request.
#[derive(Clone, Debug)]
pub struct Challenge {
    pub(crate) code: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
    pub(crate) attempts_remaining: u8,
}

impl Challenge {
    /// Expiry is checked lazily against the caller-supplied clock.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }
}
