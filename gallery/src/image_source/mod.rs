//! Sources the gallery view fetches its image URLs from

mod backend;
mod bucket;

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;

pub use backend::BackendImageSource;
pub use bucket::BucketImageSource;

use crate::key_enumerator::StorageError;
use crate::types::SignedUrl;
use crate::url_signer::SigningError;

/// Why a fetch produced no URLs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Listing the bucket failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Signing one of the listed keys failed
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The remote image backend failed or answered with garbage
    #[error("image backend error: {0}")]
    Backend(String),

    /// A failure outside the typed errors, such as a panic inside the fetch
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Yields the ordered URLs a gallery view renders
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches the current image URLs
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if any remote step fails; no partial list is returned
    async fn fetch_image_urls(&self) -> Result<Vec<SignedUrl>, FetchError>;
}

/// Fetches from `source`, turning a panic inside the fetch into `FetchError::Unknown`
///
/// # Errors
///
/// Returns the source's `FetchError`, or `FetchError::Unknown` if the fetch panicked
pub async fn fetch_catching_panics(
    source: &dyn ImageSource,
) -> Result<Vec<SignedUrl>, FetchError> {
    AssertUnwindSafe(source.fetch_image_urls())
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(FetchError::Unknown(panic_message(&*panic))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "fetch panicked".to_string())
}
