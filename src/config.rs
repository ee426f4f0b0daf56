//! Session configuration
//!
//! Callers describe what they want to change in a [`SessionOptions`]; the
//! storage resolves it once, at construction, against the platform's default
//! cookie parameters into an immutable [`SessionConfiguration`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Session name used when no override is given
pub const DEFAULT_SESSION_NAME: &str = "_SESSION";

/// `Expires` value sent by the limiters that forbid caching
const EXPIRES_IN_PAST: &str = "Thu, 19 Nov 1981 08:52:00 GMT";

/// Cookie attributes of the session cookie
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieParams {
    /// Cookie lifetime in seconds, 0 means "until the browser closes"
    pub lifetime: u64,
    /// Cookie path
    pub path: String,
    /// Cookie domain, empty for the current host only
    pub domain: String,
    /// Secure flag
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
}

impl Default for CookieParams {
    fn default() -> Self {
        Self {
            lifetime: 0,
            path: "/".to_string(),
            domain: String::new(),
            secure: false,
            http_only: false,
        }
    }
}

/// Policy for the caching headers sent alongside a session-bearing response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheLimiter {
    /// Send no caching headers at all
    #[serde(rename = "none")]
    Disabled,
    /// Forbid any caching
    #[serde(rename = "nocache")]
    NoCache,
    /// Allow private caches, with an `Expires` in the past for old proxies
    #[serde(rename = "private")]
    Private,
    /// Allow private caches, without an `Expires` header
    #[serde(rename = "private_no_expire")]
    PrivateNoExpire,
    /// Allow shared caches
    #[serde(rename = "public")]
    Public,
}

impl CacheLimiter {
    /// The configuration name of this limiter
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLimiter::Disabled => "none",
            CacheLimiter::NoCache => "nocache",
            CacheLimiter::Private => "private",
            CacheLimiter::PrivateNoExpire => "private_no_expire",
            CacheLimiter::Public => "public",
        }
    }

    /// Headers to emit when a session starts under this limiter.
    ///
    /// `expire_minutes` is the cache lifetime granted to cacheable responses.
    pub fn headers(&self, expire_minutes: u64, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let max_age = expire_minutes.saturating_mul(60);
        match self {
            CacheLimiter::Disabled => Vec::new(),
            CacheLimiter::NoCache => vec![
                ("expires", EXPIRES_IN_PAST.to_string()),
                ("cache-control", "no-store, no-cache, must-revalidate".to_string()),
                ("pragma", "no-cache".to_string()),
            ],
            CacheLimiter::Private => vec![
                ("expires", EXPIRES_IN_PAST.to_string()),
                ("cache-control", format!("private, max-age={}", max_age)),
            ],
            CacheLimiter::PrivateNoExpire => {
                vec![("cache-control", format!("private, max-age={}", max_age))]
            }
            CacheLimiter::Public => {
                let mut headers = Vec::with_capacity(2);
                // Out-of-range dates leave the decision to max-age alone
                let expires = i64::try_from(max_age)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl));
                if let Some(expires) = expires {
                    headers.push(("expires", http_date(expires)));
                }
                headers.push(("cache-control", format!("public, max-age={}", max_age)));
                headers
            }
        }
    }
}

impl fmt::Display for CacheLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheLimiter {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CacheLimiter::Disabled),
            "nocache" => Ok(CacheLimiter::NoCache),
            "private" => Ok(CacheLimiter::Private),
            "private_no_expire" => Ok(CacheLimiter::PrivateNoExpire),
            "public" => Ok(CacheLimiter::Public),
            other => Err(SessionError::InvalidCacheLimiter(other.to_string())),
        }
    }
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Caller overrides for the session configuration.
///
/// Every field left unset falls back to the platform default when the
/// storage is constructed. When deserialized, unknown keys are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionOptions {
    /// Session (cookie) name
    #[serde(default)]
    pub name: Option<String>,
    /// Cookie lifetime in seconds
    #[serde(default)]
    pub lifetime: Option<u64>,
    /// Cookie path
    #[serde(default)]
    pub path: Option<String>,
    /// Cookie domain
    #[serde(default)]
    pub domain: Option<String>,
    /// Secure flag
    #[serde(default)]
    pub secure: Option<bool>,
    /// HttpOnly flag
    #[serde(default, alias = "httponly")]
    pub http_only: Option<bool>,
    /// Cache limiter; `Some(None)` explicitly disables applying any limiter
    #[serde(default, deserialize_with = "present")]
    pub cache_limiter: Option<Option<CacheLimiter>>,
    /// Session ID to force when cookies are not used to carry it
    #[serde(default)]
    pub id: Option<String>,
}

/// Distinguishes a key given as `null` from a missing key.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl SessionOptions {
    /// Create an empty set of overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session name
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the cookie lifetime in seconds
    pub fn with_lifetime(mut self, lifetime: u64) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Set the cookie path
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the cookie domain
    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the Secure flag
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Set the HttpOnly flag
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    /// Set the cache limiter. Pass `None` to leave the platform's limiter untouched.
    pub fn with_cache_limiter(mut self, limiter: impl Into<Option<CacheLimiter>>) -> Self {
        self.cache_limiter = Some(limiter.into());
        self
    }

    /// Request a specific session ID
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Resolved session configuration, immutable once the storage is built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfiguration {
    pub name: String,
    pub lifetime: u64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
    pub cache_limiter: Option<CacheLimiter>,
    pub id: Option<String>,
}

impl SessionConfiguration {
    /// Merge `options` on top of the platform `defaults`; overrides win.
    pub fn resolve(defaults: CookieParams, options: SessionOptions) -> Self {
        Self {
            name: options
                .name
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            lifetime: options.lifetime.unwrap_or(defaults.lifetime),
            path: options.path.unwrap_or(defaults.path),
            domain: options.domain.unwrap_or(defaults.domain),
            secure: options.secure.unwrap_or(defaults.secure),
            http_only: options.http_only.unwrap_or(defaults.http_only),
            cache_limiter: options
                .cache_limiter
                .unwrap_or(Some(CacheLimiter::Disabled)),
            id: options.id,
        }
    }

    /// The cookie attributes pushed to the platform at activation
    pub fn cookie_params(&self) -> CookieParams {
        CookieParams {
            lifetime: self.lifetime,
            path: self.path.clone(),
            domain: self.domain.clone(),
            secure: self.secure,
            http_only: self.http_only,
        }
    }
}
