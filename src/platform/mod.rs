//! The session subsystem the storage drives
//!
//! [`SessionPlatform`] is the small, process-scoped surface a
//! [`NativeSessionStorage`](crate::NativeSessionStorage) needs: cookie
//! parameters, the session name and ID, activation and ID regeneration, and
//! the shared data map of the active session. Activation and regeneration are
//! not safe to repeat; guarding them is the storage's job.

mod store_platform;

pub use store_platform::StorePlatform;

use async_trait::async_trait;

use crate::config::{CacheLimiter, CookieParams};
use crate::error::SessionError;
use crate::session::SharedSessionData;

/// Session name a platform carries until a storage names the session
pub const DEFAULT_PLATFORM_SESSION_NAME: &str = "SESSID";

/// Longest session ID accepted from clients or callers
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Session subsystem consumed by the storage
#[async_trait]
pub trait SessionPlatform: Send + Sync + 'static {
    /// Cookie parameters configured for the environment
    fn default_cookie_params(&self) -> CookieParams;

    /// Set the cookie parameters used by the next activation
    fn set_cookie_params(&self, params: CookieParams);

    /// Set the cache limiter applied when the session starts
    fn set_cache_limiter(&self, limiter: CacheLimiter);

    /// Set the session name
    fn set_session_name(&self, name: &str);

    /// Whether the session ID travels in a cookie
    fn uses_cookies(&self) -> bool;

    /// The current session ID, if one is known
    fn session_id(&self) -> Option<String>;

    /// Force the ID the next activation will use. No effect once active.
    fn set_session_id(&self, id: &str);

    /// Load or create the session and populate [`SessionPlatform::data`]
    ///
    /// Fails if a session is already active.
    async fn activate(&self) -> Result<(), SessionError>;

    /// Give the active session a new ID, optionally deleting the data stored
    /// under the old one right away
    async fn regenerate_id(&self, destroy_old: bool) -> Result<(), SessionError>;

    /// The data map of the active session
    fn data(&self) -> SharedSessionData;
}

/// Environment defaults for a [`StorePlatform`]
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    /// Default cookie parameters
    pub cookie: CookieParams,

    /// Cache limiter applied at activation (default: nocache)
    pub cache_limiter: CacheLimiter,

    /// Minutes cacheable responses may be cached for (default: 180)
    pub cache_expire: u64,

    /// Carry the session ID in a cookie (default: true)
    pub use_cookies: bool,

    /// Replace IDs that have no stored session with fresh ones (default: true)
    pub strict_mode: bool,

    /// Seconds a stored session outlives its last write (default: 1440)
    pub gc_max_lifetime: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            cookie: CookieParams::default(),
            cache_limiter: CacheLimiter::NoCache,
            cache_expire: 180,
            use_cookies: true,
            strict_mode: true,
            gc_max_lifetime: 1440,
        }
    }
}

impl PlatformConfig {
    /// Create the default platform configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default cookie parameters
    pub fn with_cookie_params(mut self, cookie: CookieParams) -> Self {
        self.cookie = cookie;
        self
    }

    /// Set the default cache limiter
    pub fn with_cache_limiter(mut self, limiter: CacheLimiter) -> Self {
        self.cache_limiter = limiter;
        self
    }

    /// Set the cache lifetime in minutes
    pub fn with_cache_expire(mut self, minutes: u64) -> Self {
        self.cache_expire = minutes;
        self
    }

    /// Enable or disable carrying the session ID in a cookie
    pub fn with_use_cookies(mut self, use_cookies: bool) -> Self {
        self.use_cookies = use_cookies;
        self
    }

    /// Enable or disable strict mode
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Set the store TTL in seconds
    pub fn with_gc_max_lifetime(mut self, secs: u64) -> Self {
        self.gc_max_lifetime = secs;
        self
    }
}

/// Check that `id` is 1 to 128 characters of `[A-Za-z0-9,-]`
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b',')
}
