use std::sync::Arc;

use axum::{Extension, Json};
use tracing::instrument;

use crate::{
    image_source::{fetch_catching_panics, ImageSource},
    types::{AppError, SignedUrl},
};

/// Lists signed image URLs as a JSON array of strings
///
/// This is the endpoint a backend-sourced gallery consumes.
#[instrument(skip(image_source))]
pub async fn handler(
    Extension(image_source): Extension<Arc<dyn ImageSource>>,
) -> Result<Json<Vec<SignedUrl>>, AppError> {
    let urls = fetch_catching_panics(image_source.as_ref()).await?;

    Ok(Json(urls))
}
