//! Google Sign-In authentication
//!
//! Handles:
//! - Identity token verification
//! - Session cookies
//! - Login/logout endpoints and the current-user extractor

mod key_cache;
mod middleware;
mod oauth;
pub mod session;
mod verifier;

#[cfg(test)]
mod test_keys;
#[cfg(test)]
pub(crate) mod test_state;

pub use key_cache::JwksCache;
pub use middleware::{CurrentUser, SessionCookie, session_id_from_headers};
pub use oauth::auth_router;
pub use session::{sign_session_id, verify_session_cookie};
pub use verifier::{GoogleIdTokenVerifier, IdentityVerifier, Unauthorized, VerifiedClaims};
