//! Persistence backends for session data
//!
//! A store only moves [`SessionData`](crate::session::SessionData) in and out
//! of some medium keyed by session ID. Lifecycle rules live in the platform
//! and the storage, not here.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::SessionStore;

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;
