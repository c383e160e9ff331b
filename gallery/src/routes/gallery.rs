use std::sync::Arc;

use axum::{response::Html, Extension};
use tracing::instrument;

use crate::{gallery::ViewController, image_source::ImageSource, render::render_page};

/// Renders the gallery page
///
/// Every request mounts a fresh view and runs one fetch cycle, so nothing is
/// cached between requests. Failures render the error view rather than an
/// error status.
#[instrument(skip(image_source))]
pub async fn handler(Extension(image_source): Extension<Arc<dyn ImageSource>>) -> Html<String> {
    let view = ViewController::new(image_source);
    let state = view.activate().await;

    Html(render_page(&state))
}
