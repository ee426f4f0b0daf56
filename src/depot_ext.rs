//! Extension trait for Depot to easily access the session storage

use salvo_core::Depot;

use crate::handler::SESSION_KEY;
use crate::storage::NativeSessionStorage;

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get the session storage of the current request
    fn session_storage(&self) -> Option<&NativeSessionStorage>;
}

impl SessionDepotExt for Depot {
    fn session_storage(&self) -> Option<&NativeSessionStorage> {
        self.get::<NativeSessionStorage>(SESSION_KEY).ok()
    }
}
