//! Session error types

use std::fmt;

/// Errors that can occur during session operations
#[derive(Debug)]
pub enum SessionError {
    /// Error from the session store
    StoreError(String),
    /// Error during serialization/deserialization
    SerializationError(String),
    /// Invalid session ID format
    InvalidSessionId(String),
    /// Unknown cache limiter name
    InvalidCacheLimiter(String),
    /// Session data was accessed before `start()`
    NotStarted,
    /// The platform could not activate the session
    ActivationFailed(String),
    /// The platform could not issue a new session ID
    RegenerationFailed(String),
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    RedisError(redis::RedisError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::StoreError(msg) => write!(f, "Session store error: {}", msg),
            SessionError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::InvalidSessionId(id) => write!(f, "Invalid session ID: {}", id),
            SessionError::InvalidCacheLimiter(name) => write!(f, "Unknown cache limiter: {}", name),
            SessionError::NotStarted => write!(f, "Session has not been started"),
            SessionError::ActivationFailed(msg) => write!(f, "Failed to start session: {}", msg),
            SessionError::RegenerationFailed(msg) => {
                write!(f, "Failed to regenerate session ID: {}", msg)
            }
            #[cfg(feature = "redis-store")]
            SessionError::RedisError(e) => write!(f, "Redis error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "redis-store")]
            SessionError::RedisError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::RedisError(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}
