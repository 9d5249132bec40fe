//! Revocation set for logged-out sessions.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Token ids revoked before their natural expiry.
///
/// Each entry remembers the token's own deadline so it can be pruned once
/// the token would have died anyway; memory is bounded by the number of
/// logged-out-but-not-yet-expired tokens.
#[derive(Debug, Default)]
pub struct RevocationList {
    entries: Mutex<HashMap<Uuid, i64>>,
}

impl RevocationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token id dead until `expires_at` has passed. Idempotent.
    pub fn revoke(&self, jti: Uuid, expires_at: DateTime<Utc>) {
        self.entries.lock().insert(jti, expires_at.timestamp());
    }

    #[must_use]
    pub fn is_revoked(&self, jti: Uuid) -> bool {
        self.entries.lock().contains_key(&jti)
    }

    /// Drop entries whose token has expired on its own.
    pub fn prune_expired(&self, now: DateTime<Utc>) {
        let cutoff = now.timestamp();
        self.entries.lock().retain(|_, exp| *exp > cutoff);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn revoked_id_reports_revoked() {
        let list = RevocationList::new();
        let jti = Uuid::new_v4();
        assert!(!list.is_revoked(jti));
        list.revoke(jti, t0() + Duration::minutes(30));
        assert!(list.is_revoked(jti));
    }

    #[test]
    fn revoke_twice_is_harmless() {
        let list = RevocationList::new();
        let jti = Uuid::new_v4();
        list.revoke(jti, t0() + Duration::minutes(30));
        list.revoke(jti, t0() + Duration::minutes(30));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn prune_drops_naturally_expired_entries() {
        let list = RevocationList::new();
        let dead = Uuid::new_v4();
        let alive = Uuid::new_v4();
        list.revoke(dead, t0() + Duration::minutes(5));
        list.revoke(alive, t0() + Duration::minutes(30));

        list.prune_expired(t0() + Duration::minutes(10));
        assert!(!list.is_revoked(dead));
        assert!(list.is_revoked(alive));
    }
}
