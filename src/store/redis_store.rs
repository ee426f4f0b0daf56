//! Redis session store
//!
//! - Key: `prefix + session_id` (default prefix: "sess:")
//! - Value: the session data as a JSON object
//! - TTL: the one requested by the platform, via `SET EX`

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::SessionStore;
use crate::error::SessionError;
use crate::session::SessionData;

/// Redis session store
///
/// # Example
///
/// ```rust,ignore
/// use salvo_native_session::RedisStore;
///
/// let store = RedisStore::from_url("redis://127.0.0.1/").await?.with_prefix("app:sess:");
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Create a new Redis store with the default "sess:" prefix
    pub async fn new(client: redis::Client) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::StoreError(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn,
            prefix: "sess:".to_string(),
        }
    }

    /// Use a custom key prefix
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn make_key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }

    async fn keys(&self) -> Result<Vec<String>, SessionError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(format!("{}*", self.prefix))
            .query_async(&mut conn)
            .await?;
        Ok(keys)
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn load(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(self.make_key(sid)).await?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<(), SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn.clone();

        if ttl_secs == 0 {
            conn.del::<_, ()>(&key).await?;
            return Ok(());
        }

        let json = serde_json::to_string(data)?;
        conn.set_ex::<_, _, ()>(&key, json, ttl_secs).await?;
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.make_key(sid)).await?;
        Ok(())
    }

    async fn touch(&self, sid: &str, ttl_secs: u64) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        // EXPIRE on a missing key is a no-op, same as the memory store
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let _: bool = conn.expire(self.make_key(sid), ttl).await?;
        Ok(())
    }

    async fn exists(&self, sid: &str) -> Result<bool, SessionError> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(self.make_key(sid)).await?;
        Ok(found)
    }

    async fn clear(&self) -> Result<(), SessionError> {
        let keys = self.keys().await?;
        if !keys.is_empty() {
            let mut conn = self.conn.clone();
            conn.del::<_, ()>(keys).await?;
        }
        Ok(())
    }

    async fn length(&self) -> Result<usize, SessionError> {
        Ok(self.keys().await?.len())
    }
}
