//! End-to-end session lifecycle over the store-backed platform

use std::sync::Arc;

use salvo_native_session::{
    CacheLimiter, MemoryStore, NativeSessionStorage, PlatformConfig, SessionOptions,
    SessionPlatform, SessionStore, StorePlatform,
};

fn platform(store: &MemoryStore, config: PlatformConfig) -> Arc<StorePlatform<MemoryStore>> {
    Arc::new(StorePlatform::new(Arc::new(store.clone()), config))
}

#[tokio::test]
async fn test_full_lifecycle() {
    let store = MemoryStore::new();
    let platform = platform(&store, PlatformConfig::default());
    let defaults = platform.default_cookie_params();

    let storage = NativeSessionStorage::new(
        platform.clone(),
        SessionOptions::new().with_name("APPSESS").with_secure(true),
    );

    let config = storage.config();
    assert_eq!(config.name, "APPSESS");
    assert!(config.secure);
    assert_eq!(config.lifetime, defaults.lifetime);
    assert_eq!(config.path, defaults.path);
    assert_eq!(config.domain, defaults.domain);
    assert_eq!(config.http_only, defaults.http_only);
    assert_eq!(platform.session_name(), "APPSESS");

    storage.start().await.unwrap();
    assert!(storage.is_started());
    assert_eq!(platform.cache_limiter(), CacheLimiter::Disabled);
    assert!(platform.cookie_params().secure);

    storage.write("user/id", 42).unwrap();
    assert_eq!(storage.read::<i64>("user/id").unwrap(), Some(42));

    assert_eq!(storage.remove("user/id").unwrap(), Some(serde_json::json!(42)));
    assert_eq!(storage.read_or("user/id", "none".to_string()).unwrap(), "none");

    storage.write("user/name", "alice").unwrap();
    let first_id = storage.id().unwrap();
    store.save(&first_id, &platform.data().snapshot(), 60).await.unwrap();

    storage.regenerate(false).await.unwrap();
    assert!(storage.is_id_regenerated());
    let second_id = storage.id().unwrap();
    assert_ne!(first_id, second_id);

    // The second call is swallowed: the old record survives and the ID stays
    storage.regenerate(true).await.unwrap();
    assert_eq!(storage.id().unwrap(), second_id);
    assert!(store.exists(&first_id).await.unwrap());

    platform.write_close().await.unwrap();
    let saved = store.load(&second_id).await.unwrap().unwrap();
    assert_eq!(saved.get_as::<String>("user/name").unwrap(), Some("alice".to_string()));
}

#[tokio::test]
async fn test_session_survives_across_requests() {
    let store = MemoryStore::new();

    let first = platform(&store, PlatformConfig::default());
    let storage = NativeSessionStorage::new(first.clone(), SessionOptions::new());
    storage.start().await.unwrap();
    storage.write("cart/items", vec!["apple", "pear"]).unwrap();
    let sid = storage.id().unwrap();
    first.write_close().await.unwrap();

    let second = platform(&store, PlatformConfig::default());
    let storage = NativeSessionStorage::new(second.clone(), SessionOptions::new());
    second.offer_cookie_id(&sid);
    storage.start().await.unwrap();

    assert_eq!(storage.id().as_deref(), Some(sid.as_str()));
    assert!(!second.needs_cookie());
    assert_eq!(
        storage.read::<Vec<String>>("cart/items").unwrap(),
        Some(vec!["apple".to_string(), "pear".to_string()])
    );
}

#[tokio::test]
async fn test_requested_id_used_without_cookies() {
    let store = MemoryStore::new();
    let mut data = salvo_native_session::SessionData::new();
    data.set("user/id", 7).unwrap();
    store.save("api-token-sid", &data, 60).await.unwrap();

    let platform = platform(&store, PlatformConfig::new().with_use_cookies(false));
    let storage = NativeSessionStorage::new(
        platform.clone(),
        SessionOptions::new().with_id("api-token-sid"),
    );
    storage.start().await.unwrap();

    assert_eq!(storage.id().as_deref(), Some("api-token-sid"));
    assert_eq!(storage.read::<i64>("user/id").unwrap(), Some(7));
}

#[tokio::test]
async fn test_requested_id_not_forced_with_cookies() {
    let store = MemoryStore::new();
    store
        .save("requested", &salvo_native_session::SessionData::new(), 60)
        .await
        .unwrap();

    let platform = platform(&store, PlatformConfig::default());
    let storage =
        NativeSessionStorage::new(platform.clone(), SessionOptions::new().with_id("requested"));
    storage.start().await.unwrap();

    assert_ne!(storage.id().as_deref(), Some("requested"));
}

#[tokio::test]
async fn test_regenerate_destroying_old_data() {
    let store = MemoryStore::new();

    let first = platform(&store, PlatformConfig::default());
    let storage = NativeSessionStorage::new(first.clone(), SessionOptions::new());
    storage.start().await.unwrap();
    storage.write("user/role", "admin").unwrap();
    let old_sid = storage.id().unwrap();
    first.write_close().await.unwrap();

    let next = platform(&store, PlatformConfig::default());
    next.offer_cookie_id(&old_sid);
    let storage = NativeSessionStorage::new(next.clone(), SessionOptions::new());
    storage.start().await.unwrap();
    storage.regenerate(true).await.unwrap();

    assert!(!store.exists(&old_sid).await.unwrap());
    assert!(next.needs_cookie());
    assert_eq!(storage.read::<String>("user/role").unwrap(), Some("admin".to_string()));

    let new_sid = storage.id().unwrap();
    next.write_close().await.unwrap();
    assert!(store.exists(&new_sid).await.unwrap());
}
