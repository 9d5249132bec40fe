//! Identity normalization for rate limiting, challenges, and sessions.

use regex::Regex;

/// Normalize an email so the same mailbox always maps to the same key.
#[must_use]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn is_valid(email_normalized: &str) -> bool {
    !email_normalized.is_empty()
        && Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .is_ok_and(|regex| regex.is_match(email_normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_accepts_basic_format() {
        assert!(is_valid("a@example.com"));
        assert!(is_valid("name.surname@example.co"));
    }

    #[test]
    fn valid_rejects_missing_parts() {
        assert!(!is_valid(""));
        assert!(!is_valid("not-an-email"));
        assert!(!is_valid("missing-at.example.com"));
        assert!(!is_valid("missing-domain@"));
        assert!(!is_valid("spaces in@example.com"));
    }
}
