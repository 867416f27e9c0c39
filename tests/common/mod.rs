//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::Router;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// Client without retries so failure tests stay fast
pub fn client() -> ClientWithMiddleware {
    travel_assistant::http::build_client(Duration::from_secs(5), 0).expect("http client")
}
