//! Platform backed by a [`SessionStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use super::{is_valid_session_id, PlatformConfig, SessionPlatform, DEFAULT_PLATFORM_SESSION_NAME};
use crate::config::{CacheLimiter, CookieParams};
use crate::error::SessionError;
use crate::session::{SessionData, SharedSessionData};
use crate::store::SessionStore;

/// Values callers may change before activation
#[derive(Debug)]
struct Settings {
    name: String,
    cookie: CookieParams,
    cache_limiter: CacheLimiter,
    forced_id: Option<String>,
    cookie_id: Option<String>,
}

/// The session bound by a successful activation
#[derive(Debug)]
struct ActiveSession {
    id: String,
    is_new: bool,
    /// Data as loaded from the store, while the ID is still the loaded one
    loaded: Option<SessionData>,
}

/// A request-scoped session platform over a [`SessionStore`].
///
/// `activate` loads the session named by the forced ID or the client's cookie
/// ID from the store (or starts an empty one), `write_close` saves it back.
pub struct StorePlatform<S: SessionStore> {
    store: Arc<S>,
    config: PlatformConfig,
    settings: RwLock<Settings>,
    active: RwLock<Option<ActiveSession>>,
    data: SharedSessionData,
}

impl<S: SessionStore> StorePlatform<S> {
    /// Create a platform using `config` as its environment defaults
    pub fn new(store: Arc<S>, config: PlatformConfig) -> Self {
        let settings = Settings {
            name: DEFAULT_PLATFORM_SESSION_NAME.to_string(),
            cookie: config.cookie.clone(),
            cache_limiter: config.cache_limiter,
            forced_id: None,
            cookie_id: None,
        };
        Self {
            store,
            config,
            settings: RwLock::new(settings),
            active: RwLock::new(None),
            data: SharedSessionData::new(),
        }
    }

    /// Generate a new session ID
    fn generate_session_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Offer the session ID the client sent in its cookie.
    ///
    /// Malformed IDs are dropped so that activation starts a fresh session.
    pub fn offer_cookie_id(&self, id: &str) {
        if is_valid_session_id(id) {
            self.settings.write().cookie_id = Some(id.to_string());
        } else {
            tracing::debug!(len = id.len(), "Ignoring malformed session cookie");
        }
    }

    /// The environment defaults this platform was created with
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Current session name
    pub fn session_name(&self) -> String {
        self.settings.read().name.clone()
    }

    /// Current cookie parameters
    pub fn cookie_params(&self) -> CookieParams {
        self.settings.read().cookie.clone()
    }

    /// Current cache limiter
    pub fn cache_limiter(&self) -> CacheLimiter {
        self.settings.read().cache_limiter
    }

    /// Caching headers for a response carrying this session
    pub fn cache_headers(&self, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        self.cache_limiter().headers(self.config.cache_expire, now)
    }

    /// Whether a session is currently active
    pub fn is_active(&self) -> bool {
        self.active.read().is_some()
    }

    /// Whether the active session was created rather than loaded
    pub fn is_new(&self) -> bool {
        self.active.read().as_ref().map_or(false, |s| s.is_new)
    }

    /// Whether the client must be sent a session cookie.
    ///
    /// True when the active ID differs from the one the client presented, and
    /// for persistent cookies so that their expiry keeps moving forward.
    pub fn needs_cookie(&self) -> bool {
        let active = self.active.read();
        let Some(session) = active.as_ref() else {
            return false;
        };
        let settings = self.settings.read();
        settings.cookie_id.as_deref() != Some(session.id.as_str()) || settings.cookie.lifetime > 0
    }

    /// Save the active session to the store and end it.
    ///
    /// A loaded session whose data and ID are unchanged only has its TTL
    /// extended. Does nothing when no session is active.
    pub async fn write_close(&self) -> Result<(), SessionError> {
        let Some(session) = self.active.write().take() else {
            return Ok(());
        };
        let data = self.data.snapshot();
        let ttl = self.config.gc_max_lifetime;

        if session.loaded.as_ref() == Some(&data) {
            self.store.touch(&session.id, ttl).await?;
            tracing::debug!(sid = %session.id, "Session unchanged, TTL extended");
            return Ok(());
        }

        self.store.save(&session.id, &data, ttl).await?;
        tracing::debug!(sid = %session.id, keys = data.len(), "Session written");
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore> SessionPlatform for StorePlatform<S> {
    fn default_cookie_params(&self) -> CookieParams {
        self.config.cookie.clone()
    }

    fn set_cookie_params(&self, params: CookieParams) {
        self.settings.write().cookie = params;
    }

    fn set_cache_limiter(&self, limiter: CacheLimiter) {
        self.settings.write().cache_limiter = limiter;
    }

    fn set_session_name(&self, name: &str) {
        self.settings.write().name = name.to_string();
    }

    fn uses_cookies(&self) -> bool {
        self.config.use_cookies
    }

    fn session_id(&self) -> Option<String> {
        if let Some(session) = self.active.read().as_ref() {
            return Some(session.id.clone());
        }
        self.settings.read().forced_id.clone()
    }

    fn set_session_id(&self, id: &str) {
        if self.is_active() {
            tracing::debug!("Session already active, ignoring forced session ID");
            return;
        }
        self.settings.write().forced_id = Some(id.to_string());
    }

    async fn activate(&self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::ActivationFailed(
                "a session is already active".to_string(),
            ));
        }

        let (name, forced_id, cookie_id) = {
            let settings = self.settings.read();
            (
                settings.name.clone(),
                settings.forced_id.clone(),
                settings.cookie_id.clone(),
            )
        };

        if name.is_empty() {
            return Err(SessionError::ActivationFailed(
                "session name cannot be empty".to_string(),
            ));
        }
        if let Some(id) = forced_id.as_deref() {
            if !is_valid_session_id(id) {
                return Err(SessionError::InvalidSessionId(id.to_string()));
            }
        }

        let requested = forced_id.or(if self.config.use_cookies { cookie_id } else { None });
        let loaded = match requested.as_deref() {
            Some(id) => self
                .store
                .load(id)
                .await
                .map_err(|e| SessionError::ActivationFailed(e.to_string()))?,
            None => None,
        };

        let (id, data, is_new) = match (requested, loaded) {
            (Some(id), Some(data)) => (id, data, false),
            (Some(id), None) if !self.config.strict_mode => (id, SessionData::new(), true),
            (Some(id), None) => {
                tracing::debug!(sid = %id, "Unknown session ID replaced in strict mode");
                (Self::generate_session_id(), SessionData::new(), true)
            }
            (None, _) => (Self::generate_session_id(), SessionData::new(), true),
        };

        let loaded = if is_new { None } else { Some(data.clone()) };
        self.data.replace(data);
        tracing::debug!(sid = %id, is_new, session = %name, "Session activated");
        *self.active.write() = Some(ActiveSession { id, is_new, loaded });
        Ok(())
    }

    async fn regenerate_id(&self, destroy_old: bool) -> Result<(), SessionError> {
        let old_id = match self.active.read().as_ref() {
            Some(session) => session.id.clone(),
            None => {
                return Err(SessionError::RegenerationFailed(
                    "no active session".to_string(),
                ))
            }
        };

        if destroy_old {
            self.store
                .destroy(&old_id)
                .await
                .map_err(|e| SessionError::RegenerationFailed(e.to_string()))?;
        }

        let new_id = Self::generate_session_id();
        if let Some(session) = self.active.write().as_mut() {
            session.id = new_id.clone();
            session.loaded = None;
        }
        tracing::debug!(old = %old_id, new = %new_id, destroy_old, "Session ID regenerated");
        Ok(())
    }

    fn data(&self) -> SharedSessionData {
        self.data.clone()
    }
}
