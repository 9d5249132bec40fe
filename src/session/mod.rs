pub mod revocation;
pub mod token;

pub use revocation::RevocationList;
pub use token::{IssuedSession, SessionClaims, TokenError, TokenSigner};
