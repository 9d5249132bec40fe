//! Auth endpoints: code request/verify, session, logout.

pub mod otp;
pub mod session;
pub mod state;
pub mod types;
pub(crate) mod utils;

pub use state::{AuthConfig, AuthState, AuthenticateError};
