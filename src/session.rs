//! Session data held by the platform once a session is active

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SessionError;

/// Key/value contents of one session, persisted as a flat JSON object.
///
/// Keys are best written directory style (`"user/id"`, `"cart/items"`) so
/// unrelated writers sharing one session do not collide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    data: HashMap<String, Value>,
}

impl SessionData {
    /// Create empty session data
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value and convert it to `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.data.get(key) {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }

    /// Set a value, replacing any previous one
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let v = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), v);
        Ok(())
    }

    /// Remove a value, returning it if the key was present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if session data is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Handle to the data of the active session.
///
/// The platform owns the data; every clone of the handle sees the same map.
#[derive(Debug, Clone, Default)]
pub struct SharedSessionData {
    inner: Arc<RwLock<SessionData>>,
}

impl SharedSessionData {
    /// Create an empty shared map
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with read access to the data
    pub fn with<R>(&self, f: impl FnOnce(&SessionData) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with write access to the data
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Replace the whole contents, e.g. with data restored from a store
    pub fn replace(&self, data: SessionData) {
        *self.inner.write() = data;
    }

    /// Get a copy of the current contents
    pub fn snapshot(&self) -> SessionData {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let mut data = SessionData::new();
        data.set("user/name", "alice").unwrap();
        data.set("user/visits", 3).unwrap();

        assert_eq!(data.get_as::<String>("user/name").unwrap(), Some("alice".to_string()));
        assert_eq!(data.get_as::<i32>("user/visits").unwrap(), Some(3));
        assert_eq!(data.get_as::<i32>("user/missing").unwrap(), None);
        assert!(data.get_as::<i32>("user/name").is_err());

        assert_eq!(data.remove("user/visits"), Some(json!(3)));
        assert_eq!(data.remove("user/visits"), None);
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut data = SessionData::new();
        data.set("views", 2).unwrap();

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, json!({"views": 2}));

        let back: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_shared_handles_see_same_map() {
        let shared = SharedSessionData::new();
        let other = shared.clone();

        shared.with_mut(|d| d.set("k", true)).unwrap();
        assert!(other.with(|d| d.contains("k")));

        other.replace(SessionData::new());
        assert!(shared.snapshot().is_empty());
    }
}
