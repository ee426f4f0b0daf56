//! Session store trait

use async_trait::async_trait;
use crate::error::SessionError;
use crate::session::SessionData;

/// Trait for session persistence backends
///
/// Records are keyed by `prefix + session_id` in implementations that share
/// a namespace with other data. A TTL of 0 means the record should not be
/// kept at all.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load the data of a session
    ///
    /// Returns None if the session doesn't exist or has expired
    async fn load(&self, sid: &str) -> Result<Option<SessionData>, SessionError>;

    /// Save a session's data, replacing any previous record
    async fn save(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<(), SessionError>;

    /// Delete a session's record
    async fn destroy(&self, sid: &str) -> Result<(), SessionError>;

    /// Extend a session's TTL without rewriting its data
    async fn touch(&self, sid: &str, ttl_secs: u64) -> Result<(), SessionError>;

    /// Check whether a live record exists for `sid`
    async fn exists(&self, sid: &str) -> Result<bool, SessionError> {
        Ok(self.load(sid).await?.is_some())
    }

    /// Remove every session (optional)
    async fn clear(&self) -> Result<(), SessionError> {
        Err(SessionError::StoreError("clear not implemented".to_string()))
    }

    /// Count live sessions (optional)
    async fn length(&self) -> Result<usize, SessionError> {
        Err(SessionError::StoreError("length not implemented".to_string()))
    }
}
