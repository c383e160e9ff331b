use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Extension, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::image_source::ImageSource;
use crate::routes;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the application router over `image_source`
pub fn router(image_source: Arc<dyn ImageSource>) -> Router {
    routes::handler()
        .layer(Extension(image_source))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
}

/// Starts the server with the given dependencies
///
/// Serves until `shutdown_token` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    image_source: Arc<dyn ImageSource>,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8080), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Gallery started on http://{addr}");

    axum::serve(listener, router(image_source).into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
        })
        .await
        .map_err(anyhow::Error::from)
}
