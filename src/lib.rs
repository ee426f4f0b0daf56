//! # salvo-native-session
//!
//! Session storage for the Salvo web framework modelled on a native,
//! process-scoped session subsystem.
//!
//! A [`NativeSessionStorage`] sits on top of a [`SessionPlatform`] and offers
//! one uniform contract whatever persists the data:
//!
//! - **Configuration**: cookie name, lifetime, path, domain, secure and
//!   http-only flags plus a cache limiter, resolved once from
//!   [`SessionOptions`] merged onto the platform's defaults
//! - **Activation**: `start()` binds the session exactly once
//! - **Data access**: `read`, `write` and `remove` on the active session
//! - **Regeneration**: `regenerate()` issues a new ID at most once
//!
//! [`StorePlatform`] implements the platform over any [`SessionStore`]
//! ([`MemoryStore`], [`RedisStore`]), and [`NativeSessionHandler`] wires it
//! into a Salvo router.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_native_session::{MemoryStore, NativeSessionHandler, SessionDepotExt, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let sessions = NativeSessionHandler::new(MemoryStore::new())
//!         .with_options(SessionOptions::new().with_name("APPSESS").with_http_only(true));
//!
//!     let router = Router::new().hoop(sessions).get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> Result<String, StatusError> {
//!     let storage = depot.session_storage().ok_or_else(StatusError::internal_server_error)?;
//!     storage.start().await.map_err(|_| StatusError::internal_server_error())?;
//!
//!     let views: i64 = storage.read_or("page/views", 0).unwrap_or(0);
//!     let _ = storage.write("page/views", views + 1);
//!     Ok(format!("Views: {}", views + 1))
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod platform;
pub mod session;
pub mod storage;
pub mod store;

pub use config::{CacheLimiter, CookieParams, SessionConfiguration, SessionOptions};
pub use error::SessionError;
pub use handler::NativeSessionHandler;
pub use platform::{PlatformConfig, SessionPlatform, StorePlatform};
pub use session::{SessionData, SharedSessionData};
pub use storage::NativeSessionStorage;
pub use store::{MemoryStore, SessionStore};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

/// Extension trait for Depot to easily access the session storage
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
