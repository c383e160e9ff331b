use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, routing::get, Json, Router};
use gallery::{
    image_source::{BucketImageSource, ImageSource},
    key_enumerator::KeyEnumerator,
    server,
    testing::InMemoryStorage,
    url_signer::UrlSigner,
};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const PRESIGN_EXPIRY: std::time::Duration = std::time::Duration::from_secs(3600);

/// Setup test environment variables and tracing
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// A bucket-backed image source over in-memory storage
pub fn bucket_source(storage: Arc<InMemoryStorage>, bucket: &str) -> Arc<dyn ImageSource> {
    Arc::new(BucketImageSource::new(
        bucket.to_string(),
        KeyEnumerator::new(storage.clone()),
        UrlSigner::new(storage, PRESIGN_EXPIRY),
    ))
}

/// Router wired to a given image source
pub struct TestContext {
    pub router: Router,
}

impl TestContext {
    pub fn new(image_source: Arc<dyn ImageSource>) -> Self {
        setup_test_env();

        Self {
            router: server::router(image_source),
        }
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}

pub async fn response_text(response: Response) -> String {
    use http_body_util::BodyExt;

    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(body.to_vec()).expect("Body is not UTF-8")
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let text = response_text(response).await;
    serde_json::from_str(&text).expect("Body is not JSON")
}

/// Serves `router` on an ephemeral local port and returns its address
pub async fn spawn_local_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    addr
}

/// A stand-in image backend answering `GET /images` with `body`
pub fn backend_answering(status: axum::http::StatusCode, body: serde_json::Value) -> Router {
    Router::new().route(
        "/images",
        get(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    )
}
