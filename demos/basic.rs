//! Basic example using the in-memory session store

use salvo::prelude::*;
use salvo_native_session::{
    CacheLimiter, MemoryStore, NativeSessionHandler, NativeSessionStorage, SessionDepotExt,
    SessionOptions,
};

async fn started(depot: &mut Depot) -> Result<NativeSessionStorage, StatusError> {
    let storage = depot
        .session_storage()
        .cloned()
        .ok_or_else(StatusError::internal_server_error)?;
    storage
        .start()
        .await
        .map_err(|_| StatusError::internal_server_error())?;
    Ok(storage)
}

#[handler]
async fn index(depot: &mut Depot) -> Result<String, StatusError> {
    let storage = started(depot).await?;

    let views: i64 = storage.read_or("page/views", 0).unwrap_or(0);
    let _ = storage.write("page/views", views + 1);

    Ok(format!(
        "Hello! You have viewed this page {} time(s).\nSession ID: {}",
        views + 1,
        storage.id().unwrap_or_default()
    ))
}

#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> Result<String, StatusError> {
    let storage = started(depot).await?;
    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());

    // New privileges, new ID
    storage
        .regenerate(true)
        .await
        .map_err(|_| StatusError::internal_server_error())?;
    let _ = storage.write("user/name", &username);

    Ok(format!("Logged in as: {}", username))
}

#[handler]
async fn logout(depot: &mut Depot) -> Result<&'static str, StatusError> {
    let storage = started(depot).await?;

    match storage.remove("user/name") {
        Ok(Some(_)) => Ok("Logged out successfully"),
        _ => Ok("Not logged in"),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let sessions = NativeSessionHandler::new(MemoryStore::new()).with_options(
        SessionOptions::new()
            .with_name("APPSESS")
            .with_http_only(true)
            .with_cache_limiter(CacheLimiter::NoCache),
    );

    let router = Router::new()
        .hoop(sessions)
        .get(index)
        .push(Router::with_path("login").get(login))
        .push(Router::with_path("logout").get(logout));

    println!("Server running at http://127.0.0.1:5800");
    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    Server::new(acceptor).serve(router).await;
}
