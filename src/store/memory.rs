//! In-memory session store
//!
//! Records live as long as the process. Useful for development, tests and
//! single-instance deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::SessionStore;
use crate::error::SessionError;
use crate::session::SessionData;

struct Record {
    data: SessionData,
    /// None when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Record {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

fn expiry(ttl_secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(ttl_secs))
}

/// In-memory session store
///
/// Clones share the same underlying map, so one store can back every
/// request of a server.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired record
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.records.write().retain(|_, record| record.is_live(now));
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let records = self.records.read();
        Ok(records
            .get(sid)
            .filter(|record| record.is_live(Instant::now()))
            .map(|record| record.data.clone()))
    }

    async fn save(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<(), SessionError> {
        if ttl_secs == 0 {
            self.records.write().remove(sid);
            return Ok(());
        }

        let record = Record {
            data: data.clone(),
            expires_at: expiry(ttl_secs),
        };
        self.records.write().insert(sid.to_string(), record);
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.records.write().remove(sid);
        Ok(())
    }

    async fn touch(&self, sid: &str, ttl_secs: u64) -> Result<(), SessionError> {
        if let Some(record) = self.records.write().get_mut(sid) {
            record.expires_at = expiry(ttl_secs);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.records.write().clear();
        Ok(())
    }

    async fn length(&self) -> Result<usize, SessionError> {
        self.cleanup_expired();
        Ok(self.records.read().len())
    }
}
