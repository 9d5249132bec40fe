//! # Galerio (Gallery Access Gate)
//!
//! `galerio` gates a static image gallery behind an email one-time-code
//! challenge and a short-lived bearer token.
//!
//! ## Flow
//!
//! A visitor submits their email, receives a 6-digit code, and exchanges
//! it for a signed session token. Every gallery request presents that
//! token; logout revokes it before its natural expiry.
//!
//! - **Codes:** 6 uniform random digits, valid 5 minutes, 3 verification
//!   attempts, at most 3 sends per address in a sliding 15-minute window.
//! - **Sessions:** self-describing HS256 tokens valid 30 minutes; no
//!   server-side session table, only a revocation set for logouts.
//! - **State:** entirely in-memory and keyed by normalized email, with
//!   per-identity mutual exclusion so concurrent requests for the same
//!   address cannot race the attempt counter. Expiry is enforced lazily
//!   on access; a background sweep only bounds memory.
//!
//! All limits are configurable via CLI flags or `GALERIO_*` environment
//! variables.

pub mod api;
pub mod cli;
pub mod otp;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
