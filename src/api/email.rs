//! Code delivery abstraction.
//!
//! The engine never sends email itself: it hands the generated code to
//! the HTTP handler, which passes it to an [`OtpSender`] after the
//! engine's per-identity lock has been released. A failed send is
//! reported to the caller but does not discard the challenge; the code
//! stays valid and a retry goes through the normal rate limit.

use anyhow::Result;
use tracing::info;

/// One code delivery to one mailbox.
#[derive(Clone, Debug)]
pub struct OtpEmail {
    pub to_email: String,
    pub code: String,
    pub expires_in_seconds: u64,
}

/// Email delivery boundary.
pub trait OtpSender: Send + Sync {
    /// Deliver the code or return an error for the caller to surface.
    fn send(&self, message: &OtpEmail) -> Result<()>;
}

/// Local dev sender that logs instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogOtpSender;

impl OtpSender for LogOtpSender {
    fn send(&self, message: &OtpEmail) -> Result<()> {
        info!(
            to_email = %message.to_email,
            code = %message.code,
            expires_in_seconds = message.expires_in_seconds,
            "otp delivery stub"
        );
        Ok(())
    }
}
