//! Sliding-window limiter for code sends per identity.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Tracks code-send timestamps per identity within a trailing window.
///
/// Entries older than the window are pruned on every check, so memory is
/// bounded by the identities active inside the window times the send cap.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_sends: usize,
    entries: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(window: Duration, max_sends: usize) -> Self {
        Self {
            window,
            max_sends,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `identity` may send another code at `now`.
    ///
    /// Prunes aged-out timestamps for the identity as a side effect.
    pub fn allow(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(identity) {
            Some(sends) => {
                let cutoff = now - self.window;
                sends.retain(|sent_at| *sent_at > cutoff);
                if sends.is_empty() {
                    entries.remove(identity);
                    return true;
                }
                sends.len() < self.max_sends
            }
            None => true,
        }
    }

    /// Record a send for `identity`. Callers check [`Self::allow`] first;
    /// the engine holds the per-identity lock across both calls.
    pub fn record(&self, identity: &str, now: DateTime<Utc>) {
        self.entries
            .lock()
            .entry(identity.to_string())
            .or_default()
            .push(now);
    }

    /// How long a limited identity has to wait before the oldest in-window
    /// send ages out and another send can succeed.
    pub fn retry_after(&self, identity: &str, now: DateTime<Utc>) -> Duration {
        let entries = self.entries.lock();
        let cutoff = now - self.window;
        entries
            .get(identity)
            .and_then(|sends| sends.iter().filter(|sent_at| **sent_at > cutoff).min())
            .map_or_else(Duration::zero, |oldest| *oldest + self.window - now)
    }

    /// Drop identities whose every send has aged out of the window.
    pub fn prune(&self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        self.entries.lock().retain(|_, sends| {
            sends.retain(|sent_at| *sent_at > cutoff);
            !sends.is_empty()
        });
    }

    #[cfg(test)]
    pub(crate) fn tracked_identities(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::minutes(15), 3)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn fourth_send_in_window_is_rejected() {
        let limiter = limiter();
        let now = t0();
        for _ in 0..3 {
            assert!(limiter.allow("a@b.com", now));
            limiter.record("a@b.com", now);
        }
        assert!(!limiter.allow("a@b.com", now));
    }

    #[test]
    fn window_slides_per_entry() {
        let limiter = limiter();
        let start = t0();
        limiter.record("a@b.com", start);
        limiter.record("a@b.com", start + Duration::minutes(10));
        limiter.record("a@b.com", start + Duration::minutes(14));

        // All three still inside the trailing window.
        assert!(!limiter.allow("a@b.com", start + Duration::minutes(14)));
        // The first entry ages out 15 minutes after it was recorded.
        assert!(limiter.allow("a@b.com", start + Duration::minutes(15) + Duration::seconds(1)));
    }

    #[test]
    fn retry_after_tracks_oldest_entry() {
        let limiter = limiter();
        let start = t0();
        limiter.record("a@b.com", start);
        limiter.record("a@b.com", start + Duration::minutes(1));
        limiter.record("a@b.com", start + Duration::minutes(2));

        let wait = limiter.retry_after("a@b.com", start + Duration::minutes(5));
        assert_eq!(wait, Duration::minutes(10));
    }

    #[test]
    fn identities_do_not_share_windows() {
        let limiter = limiter();
        let now = t0();
        for _ in 0..3 {
            limiter.record("a@b.com", now);
        }
        assert!(!limiter.allow("a@b.com", now));
        assert!(limiter.allow("c@d.com", now));
    }

    #[test]
    fn prune_drops_aged_out_identities() {
        let limiter = limiter();
        let start = t0();
        limiter.record("a@b.com", start);
        limiter.record("c@d.com", start + Duration::minutes(14));
        limiter.prune(start + Duration::minutes(16));
        assert_eq!(limiter.tracked_identities(), 1);
    }
}
