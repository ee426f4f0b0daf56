//! Salvo middleware running one session storage per request

use async_trait::async_trait;
use chrono::Utc;
use salvo_core::http::cookie::time::Duration;
use salvo_core::http::cookie::Cookie;
use salvo_core::http::header::{HeaderName, HeaderValue};
use salvo_core::http::StatusCode;
use salvo_core::{Depot, FlowCtrl, Handler, Request, Response};
use std::sync::Arc;

use crate::config::{CookieParams, SessionOptions};
use crate::platform::{PlatformConfig, SessionPlatform, StorePlatform};
use crate::storage::NativeSessionStorage;
use crate::store::SessionStore;

pub(crate) const SESSION_KEY: &str = "salvo.native.session";

/// Session middleware for Salvo
///
/// For every request it builds a [`StorePlatform`] over the shared store and
/// a [`NativeSessionStorage`] on top of it, and puts the storage in the depot.
/// Once the rest of the chain has run, a started session gets its caching
/// headers, is written back to the store, and the session cookie is sent when
/// the client does not already hold the current ID.
pub struct NativeSessionHandler<S: SessionStore> {
    store: Arc<S>,
    platform: PlatformConfig,
    options: SessionOptions,
    auto_start: bool,
}

impl<S: SessionStore> NativeSessionHandler<S> {
    /// Create a handler with default platform settings and no overrides
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            platform: PlatformConfig::default(),
            options: SessionOptions::default(),
            auto_start: false,
        }
    }

    /// Set the platform (environment) defaults
    pub fn with_platform_config(mut self, platform: PlatformConfig) -> Self {
        self.platform = platform;
        self
    }

    /// Set the per-storage overrides
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Start the session before the rest of the chain runs (default: false)
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    fn apply_cache_headers(platform: &StorePlatform<S>, res: &mut Response) {
        for (name, value) in platform.cache_headers(Utc::now()) {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    res.headers_mut()
                        .entry(HeaderName::from_static(name))
                        .or_insert(value);
                }
                Err(e) => tracing::warn!("Invalid {} header value: {}", name, e),
            }
        }
    }
}

impl<S: SessionStore> Clone for NativeSessionHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            platform: self.platform.clone(),
            options: self.options.clone(),
            auto_start: self.auto_start,
        }
    }
}

/// Build the session cookie for `sid`
pub(crate) fn session_cookie(name: &str, sid: &str, params: &CookieParams) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), sid.to_string()))
        .path(params.path.clone())
        .secure(params.secure)
        .http_only(params.http_only);

    if !params.domain.is_empty() {
        builder = builder.domain(params.domain.clone());
    }
    // Lifetime 0 leaves a browser-session cookie
    if params.lifetime > 0 {
        let secs = i64::try_from(params.lifetime).unwrap_or(i64::MAX);
        builder = builder.max_age(Duration::seconds(secs));
    }

    builder.build()
}

#[async_trait]
impl<S: SessionStore> Handler for NativeSessionHandler<S> {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let platform = Arc::new(StorePlatform::new(
            Arc::clone(&self.store),
            self.platform.clone(),
        ));
        let storage = NativeSessionStorage::new(platform.clone(), self.options.clone());

        if platform.uses_cookies() {
            if let Some(cookie) = req.cookie(&storage.config().name) {
                let raw = cookie.value();
                let sid = match urlencoding::decode(raw) {
                    Ok(d) => d.into_owned(),
                    Err(_) => raw.to_string(),
                };
                platform.offer_cookie_id(&sid);
            }
        }

        if self.auto_start {
            if let Err(e) = storage.start().await {
                tracing::error!("Failed to start session: {}", e);
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        }

        depot.insert(SESSION_KEY, storage);

        ctrl.call_next(req, depot, res).await;

        // Sessions never started by the chain leave no trace
        if !platform.is_active() {
            return;
        }

        Self::apply_cache_headers(&platform, res);

        let send_cookie = platform.uses_cookies() && platform.needs_cookie();
        let sid = platform.session_id();

        // An ID whose data never reached the store is not worth handing out
        if let Err(e) = platform.write_close().await {
            tracing::error!("Failed to save session: {}", e);
            return;
        }

        if let (true, Some(sid)) = (send_cookie, sid) {
            let cookie = session_cookie(&platform.session_name(), &sid, &platform.cookie_params());
            res.add_cookie(cookie);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_session_cookie() {
        let cookie = session_cookie("APPSESS", "abc123", &CookieParams::default());

        assert_eq!(cookie.name(), "APPSESS");
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), None);
        assert_eq!(cookie.max_age(), None);
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.http_only(), Some(false));
    }

    #[test]
    fn test_persistent_cookie_attributes() {
        let params = CookieParams {
            lifetime: 3600,
            path: "/app".to_string(),
            domain: "example.com".to_string(),
            secure: true,
            http_only: true,
        };
        let cookie = session_cookie("APPSESS", "abc123", &params);

        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn test_huge_lifetime_clamps_max_age() {
        let params = CookieParams {
            lifetime: u64::MAX,
            ..CookieParams::default()
        };
        let cookie = session_cookie("APPSESS", "abc123", &params);

        assert_eq!(cookie.max_age(), Some(Duration::seconds(i64::MAX)));
    }
}
