pub mod code;
pub mod engine;
pub mod identity;
pub mod models;
pub mod rate_limit;
pub mod store;

pub use engine::{IssuedChallenge, OtpEngine, OtpPolicy, RequestError, VerifyError};
pub use models::Challenge;
pub use rate_limit::RateLimiter;
pub use store::{AttemptOutcome, OtpStore};
