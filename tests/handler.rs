//! Requests through the session middleware

use async_trait::async_trait;
use salvo::http::header::{HeaderValue, CACHE_CONTROL, SET_COOKIE};
use salvo::prelude::*;
use salvo::test::{ResponseExt, TestClient};

use salvo_native_session::{
    CacheLimiter, MemoryStore, NativeSessionHandler, SessionData, SessionDepotExt, SessionError,
    SessionOptions, SessionStore,
};

const URL: &str = "http://127.0.0.1:5800/";
const COOKIE: &str = "_SESSION";

#[handler]
async fn count_views(depot: &mut Depot) -> String {
    let storage = depot.session_storage().cloned().unwrap();
    storage.start().await.unwrap();
    let views = storage.read_or("page/views", 0i64).unwrap() + 1;
    storage.write("page/views", views).unwrap();
    views.to_string()
}

#[handler]
async fn without_session() -> &'static str {
    "no session"
}

#[handler]
async fn cacheable_page(depot: &mut Depot, res: &mut Response) {
    let storage = depot.session_storage().cloned().unwrap();
    storage.start().await.unwrap();
    res.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=60"));
    res.render("cacheable");
}

#[handler]
async fn mark_reached(res: &mut Response) {
    res.headers_mut()
        .insert("x-reached", HeaderValue::from_static("yes"));
}

/// Store that can load but never persist
struct ReadOnlyStore;

#[async_trait]
impl SessionStore for ReadOnlyStore {
    async fn load(&self, _sid: &str) -> Result<Option<SessionData>, SessionError> {
        Ok(None)
    }

    async fn save(&self, _sid: &str, _data: &SessionData, _ttl: u64) -> Result<(), SessionError> {
        Err(SessionError::StoreError("read-only".to_string()))
    }

    async fn destroy(&self, _sid: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn touch(&self, _sid: &str, _ttl: u64) -> Result<(), SessionError> {
        Ok(())
    }
}

fn service<S: SessionStore>(sessions: NativeSessionHandler<S>, page: impl Handler) -> Service {
    Service::new(Router::new().hoop(sessions).get(page))
}

/// Value of the session cookie the response sets, if any
fn sent_session_id(res: &Response) -> Option<String> {
    if let Some(cookie) = res.cookie(COOKIE) {
        return Some(cookie.value().to_string());
    }
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("_SESSION="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_cookie_issued_once_and_session_persisted() {
    let store = MemoryStore::new();
    let service = service(NativeSessionHandler::new(store.clone()), count_views);

    let mut res = TestClient::get(URL).send(&service).await;
    assert_eq!(res.take_string().await.unwrap(), "1");
    let sid = sent_session_id(&res).expect("new session sets a cookie");
    assert_eq!(store.length().await.unwrap(), 1);

    let mut res = TestClient::get(URL)
        .add_header("cookie", format!("{}={}", COOKIE, sid), true)
        .send(&service)
        .await;
    assert_eq!(res.take_string().await.unwrap(), "2");
    assert_eq!(sent_session_id(&res), None);
    assert_eq!(store.length().await.unwrap(), 1);

    let saved = store.load(&sid).await.unwrap().unwrap();
    assert_eq!(saved.get_as::<i64>("page/views").unwrap(), Some(2));
}

#[tokio::test]
async fn test_url_encoded_cookie_is_decoded() {
    let store = MemoryStore::new();
    let mut data = SessionData::new();
    data.set("page/views", 4).unwrap();
    store.save("abc-123,x", &data, 60).await.unwrap();
    let service = service(NativeSessionHandler::new(store.clone()), count_views);

    let mut res = TestClient::get(URL)
        .add_header("cookie", format!("{}=abc-123%2Cx", COOKIE), true)
        .send(&service)
        .await;

    assert_eq!(res.take_string().await.unwrap(), "5");
    assert_eq!(sent_session_id(&res), None);
}

#[tokio::test]
async fn test_unstarted_session_leaves_no_trace() {
    let store = MemoryStore::new();
    let sessions = NativeSessionHandler::new(store.clone())
        .with_options(SessionOptions::new().with_cache_limiter(CacheLimiter::NoCache));
    let service = service(sessions, without_session);

    let mut res = TestClient::get(URL).send(&service).await;

    assert_eq!(res.take_string().await.unwrap(), "no session");
    assert_eq!(sent_session_id(&res), None);
    assert!(res.headers().get("pragma").is_none());
    assert_eq!(store.length().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cache_headers_added_without_overriding() {
    let sessions = NativeSessionHandler::new(MemoryStore::new())
        .with_options(SessionOptions::new().with_cache_limiter(CacheLimiter::NoCache));
    let service = service(sessions, cacheable_page);

    let res = TestClient::get(URL).send(&service).await;

    assert_eq!(res.headers().get(CACHE_CONTROL).unwrap(), "public, max-age=60");
    assert_eq!(res.headers().get("pragma").unwrap(), "no-cache");
    assert_eq!(
        res.headers().get("expires").unwrap(),
        "Thu, 19 Nov 1981 08:52:00 GMT"
    );
}

#[tokio::test]
async fn test_failed_auto_start_skips_chain() {
    let sessions = NativeSessionHandler::new(MemoryStore::new())
        .with_options(SessionOptions::new().with_name(""))
        .with_auto_start(true);
    let service = service(sessions, mark_reached);

    let res = TestClient::get(URL).send(&service).await;

    assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(res.headers().get("x-reached").is_none());
}

#[tokio::test]
async fn test_auto_start_runs_before_chain() {
    let store = MemoryStore::new();
    let sessions = NativeSessionHandler::new(store.clone()).with_auto_start(true);
    let service = service(sessions, mark_reached);

    let res = TestClient::get(URL).send(&service).await;

    assert_eq!(res.headers().get("x-reached").unwrap(), "yes");
    assert!(sent_session_id(&res).is_some());
    assert_eq!(store.length().await.unwrap(), 1);
}

#[tokio::test]
async fn test_no_cookie_when_write_back_fails() {
    let service = service(NativeSessionHandler::new(ReadOnlyStore), count_views);

    let mut res = TestClient::get(URL).send(&service).await;

    assert_eq!(res.take_string().await.unwrap(), "1");
    assert_eq!(sent_session_id(&res), None);
}
