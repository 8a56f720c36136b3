//! Data models
//!
//! Session identifiers and the user record cached inside a session.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

// =============================================================================
// Session ID
// =============================================================================

/// Opaque session identifier
///
/// 32 bytes from the OS RNG, base64url encoded without padding
/// (43 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        use base64::{Engine as _, engine::general_purpose};

        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// User Record
// =============================================================================

/// Identity facts asserted by the provider at login time
///
/// Immutable once stored; lives only as long as the session holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Provider subject id (`sub` claim)
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name (`name` claim)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// =============================================================================
// Session Record
// =============================================================================

/// A live session as held by the store
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user: UserRecord,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(user: UserRecord) -> Self {
        Self {
            user,
            created_at: Utc::now(),
        }
    }

    /// Time since the session was opened
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}
