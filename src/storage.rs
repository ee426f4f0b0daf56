//! Session storage over a [`SessionPlatform`]
//!
//! [`NativeSessionStorage`] resolves its configuration once, activates the
//! platform session at most once, regenerates its ID at most once, and gives
//! read/write/remove access to the active session's data.
//!
//! ```rust,ignore
//! let storage = NativeSessionStorage::new(platform, SessionOptions::new().with_name("APPSESS"));
//! storage.start().await?;
//! storage.write("user/id", 42)?;
//! let id: Option<i64> = storage.read("user/id")?;
//! storage.regenerate(true).await?;
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{SessionConfiguration, SessionOptions};
use crate::error::SessionError;
use crate::platform::SessionPlatform;
use crate::session::SharedSessionData;

/// Lifecycle flags of one storage
#[derive(Debug, Default)]
struct SessionState {
    started: AtomicBool,
    id_regenerated: AtomicBool,
    /// Held while a flag is being checked and flipped around a platform call
    transition: Mutex<()>,
}

struct Inner {
    platform: Arc<dyn SessionPlatform>,
    config: SessionConfiguration,
    state: SessionState,
}

/// Session storage handle.
///
/// Clones share configuration, lifecycle state and platform.
#[derive(Clone)]
pub struct NativeSessionStorage {
    inner: Arc<Inner>,
}

impl NativeSessionStorage {
    /// Create a storage, resolving `options` against the platform's defaults.
    ///
    /// The resolved session name is pushed to the platform right away.
    pub fn new(platform: Arc<dyn SessionPlatform>, options: SessionOptions) -> Self {
        let config = SessionConfiguration::resolve(platform.default_cookie_params(), options);
        platform.set_session_name(&config.name);

        Self {
            inner: Arc::new(Inner {
                platform,
                config,
                state: SessionState::default(),
            }),
        }
    }

    /// The resolved configuration
    pub fn config(&self) -> &SessionConfiguration {
        &self.inner.config
    }

    /// Whether `start` has completed
    pub fn is_started(&self) -> bool {
        self.inner.state.started.load(Ordering::SeqCst)
    }

    /// Whether `regenerate` has completed
    pub fn is_id_regenerated(&self) -> bool {
        self.inner.state.id_regenerated.load(Ordering::SeqCst)
    }

    /// The platform's current session ID
    pub fn id(&self) -> Option<String> {
        self.inner.platform.session_id()
    }

    /// Start the session.
    ///
    /// Only the first successful call does anything; later calls return
    /// immediately without touching the platform.
    pub async fn start(&self) -> Result<(), SessionError> {
        let state = &self.inner.state;
        if state.started.load(Ordering::SeqCst) {
            return Ok(());
        }
        let _guard = state.transition.lock().await;
        if state.started.load(Ordering::SeqCst) {
            return Ok(());
        }

        let platform = &self.inner.platform;
        let config = &self.inner.config;

        platform.set_cookie_params(config.cookie_params());

        if let Some(limiter) = config.cache_limiter {
            platform.set_cache_limiter(limiter);
        }

        // The ID has to be in place before activation to take effect
        if !platform.uses_cookies() {
            if let Some(id) = config.id.as_deref().filter(|id| !id.is_empty()) {
                if platform.session_id().as_deref() != Some(id) {
                    platform.set_session_id(id);
                }
            }
        }

        platform.activate().await?;

        state.started.store(true, Ordering::SeqCst);
        tracing::debug!(session = %config.name, "Session started");
        Ok(())
    }

    fn data(&self) -> Result<SharedSessionData, SessionError> {
        if !self.is_started() {
            return Err(SessionError::NotStarted);
        }
        Ok(self.inner.platform.data())
    }

    /// Read the value stored under `key`.
    ///
    /// Keys are best written directory style (`"user/id"`) to avoid clashes.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        self.data()?.with(|data| data.get_as(key))
    }

    /// Read the value stored under `key`, or `default` when it is absent
    pub fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, SessionError> {
        Ok(self.read(key)?.unwrap_or(default))
    }

    /// Check whether `key` is present
    pub fn contains(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.data()?.with(|data| data.contains(key)))
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn write<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        self.data()?.with_mut(|data| data.set(key, value))
    }

    /// Remove `key`, returning its value.
    ///
    /// `None` means the key was absent; a stored null comes back as
    /// `Some(Value::Null)`.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.data()?.with_mut(|data| data.remove(key)))
    }

    /// Give the session a new ID.
    ///
    /// With `destroy_old` the data stored under the previous ID is deleted
    /// immediately, otherwise it is left to expire. Only the first successful
    /// call does anything.
    pub async fn regenerate(&self, destroy_old: bool) -> Result<(), SessionError> {
        let state = &self.inner.state;
        if state.id_regenerated.load(Ordering::SeqCst) {
            tracing::debug!("Session ID already regenerated, skipping");
            return Ok(());
        }
        let _guard = state.transition.lock().await;
        if state.id_regenerated.load(Ordering::SeqCst) {
            tracing::debug!("Session ID already regenerated, skipping");
            return Ok(());
        }

        self.inner.platform.regenerate_id(destroy_old).await?;

        state.id_regenerated.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for NativeSessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeSessionStorage")
            .field("config", &self.inner.config)
            .field("started", &self.is_started())
            .field("id_regenerated", &self.is_id_regenerated())
            .finish()
    }
}
