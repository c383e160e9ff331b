mod gallery;
mod health;
mod images;

use axum::{routing::get, Router};

/// Creates the router with all handler routes
pub fn handler() -> Router {
    Router::new()
        .route("/", get(gallery::handler))
        .route("/images", get(images::handler))
        .route("/health", get(health::handler))
}
