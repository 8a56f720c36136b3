//! Session store
//!
//! Sessions are volatile and cleared on restart.
//! Uses Moka for high-performance concurrent caching, which also
//! enforces the idle and absolute expiry.

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::models::{SessionId, SessionRecord, UserRecord};
use crate::config::SessionConfig;
use crate::error::StorageError;

/// Backend holding session id -> user record
///
/// Each operation is atomic for a single id. Handlers only ever see this
/// trait through `AppState`, so a persistent backend can replace the
/// in-memory one without touching them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `user` under a fresh identifier and return the identifier
    async fn create(&self, user: UserRecord) -> Result<SessionId, StorageError>;

    /// Look up the user bound to `id`
    ///
    /// `Ok(None)` for unknown, destroyed, or expired sessions.
    async fn resolve(&self, id: &SessionId) -> Result<Option<UserRecord>, StorageError>;

    /// Remove the session; removing an absent session succeeds
    async fn destroy(&self, id: &SessionId) -> Result<(), StorageError>;
}

// =============================================================================
// Memory Session Store
// =============================================================================

/// In-process session store
///
/// Entries expire after `idle_timeout` without a lookup, and in any case
/// `max_age` after creation.
pub struct MemorySessionStore {
    /// Session ID -> SessionRecord
    sessions: Cache<SessionId, Arc<SessionRecord>>,
}

impl MemorySessionStore {
    /// Create a store using the configured expiry policy
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_limits(
            Duration::from_secs(config.idle_timeout_secs),
            Duration::from_secs(config.max_age_secs),
            config.max_sessions,
        )
    }

    /// Create a store with explicit limits
    ///
    /// # Arguments
    /// * `idle_timeout` - Drop a session this long after its last lookup
    /// * `max_age` - Drop a session this long after creation
    /// * `max_sessions` - Capacity; least recently used sessions are evicted beyond it
    pub fn with_limits(idle_timeout: Duration, max_age: Duration, max_sessions: u64) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .time_to_live(max_age)
            .build();

        Self { sessions }
    }

    /// Number of live sessions after flushing pending expirations
    pub async fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    fn record_size(&self) {
        use crate::metrics::SESSIONS_ACTIVE;
        SESSIONS_ACTIVE.set(self.sessions.entry_count() as i64);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user: UserRecord) -> Result<SessionId, StorageError> {
        loop {
            let id = SessionId::generate();
            let record = SessionRecord::new(user.clone());
            let entry = self
                .sessions
                .entry(id.clone())
                .or_insert_with(async move { Arc::new(record) })
                .await;

            if entry.is_fresh() {
                self.record_size();
                return Ok(id);
            }

            tracing::warn!("Session id collision, drawing a new id");
        }
    }

    async fn resolve(&self, id: &SessionId) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.sessions.get(id).await.map(|record| record.user.clone()))
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StorageError> {
        if let Some(record) = self.sessions.remove(id).await {
            tracing::debug!(
                age_secs = record.age().num_seconds(),
                "Removed session"
            );
        }
        self.record_size();
        Ok(())
    }
}
