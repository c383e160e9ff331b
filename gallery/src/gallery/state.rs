use tracing::{error, warn};

use crate::image_source::FetchError;
use crate::types::SignedUrl;

/// Message shown for any typed fetch failure
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load images.";

/// Message shown when the fetch failed in an unexpected way
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// What the gallery view currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// A fetch is in flight
    #[default]
    Loading,
    /// URLs to render, never empty
    Ready(Vec<SignedUrl>),
    /// The fetch succeeded with no images
    Empty,
    /// The fetch failed
    Error(String),
}

impl ViewState {
    /// Maps a successful fetch to `Ready`, or `Empty` when there is nothing to show
    #[must_use]
    pub fn from_urls(urls: Vec<SignedUrl>) -> Self {
        if urls.is_empty() {
            Self::Empty
        } else {
            Self::Ready(urls)
        }
    }

    /// Maps the outcome of a fetch to the state it settles in
    ///
    /// Failures are logged here with their cause and collapse to a fixed
    /// user-facing message.
    #[must_use]
    pub fn from_fetch_result(result: Result<Vec<SignedUrl>, FetchError>) -> Self {
        match result {
            Ok(urls) => Self::from_urls(urls),
            Err(FetchError::Unknown(detail)) => {
                error!("Unknown error while loading images: {detail}");
                Self::Error(UNKNOWN_ERROR_MESSAGE.to_string())
            }
            Err(err @ FetchError::Storage(_)) => {
                warn!("Failed to list images: {err}");
                Self::Error(LOAD_FAILED_MESSAGE.to_string())
            }
            Err(err @ FetchError::Signing(_)) => {
                warn!("Failed to sign image URLs: {err}");
                Self::Error(LOAD_FAILED_MESSAGE.to_string())
            }
            Err(err @ FetchError::Backend(_)) => {
                warn!("Failed to fetch images: {err}");
                Self::Error(LOAD_FAILED_MESSAGE.to_string())
            }
        }
    }

    /// Whether a fetch is still in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_enumerator::StorageError;
    use crate::media_storage::BucketError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_urls_never_become_ready() {
        assert_eq!(ViewState::from_urls(Vec::new()), ViewState::Empty);
        assert_eq!(ViewState::from_fetch_result(Ok(Vec::new())), ViewState::Empty);
    }

    #[test]
    fn test_urls_become_ready() {
        let urls = vec![SignedUrl::from("http://mock.url/image1.jpg")];
        assert_eq!(
            ViewState::from_fetch_result(Ok(urls.clone())),
            ViewState::Ready(urls)
        );
    }

    #[test]
    fn test_failures_map_to_fixed_messages() {
        let storage = FetchError::Storage(StorageError::ListPage {
            bucket: "photos".to_string(),
            page: 1,
            source: BucketError::S3Error("AccessDenied".to_string()),
        });
        assert_eq!(
            ViewState::from_fetch_result(Err(storage)),
            ViewState::Error(LOAD_FAILED_MESSAGE.to_string())
        );

        assert_eq!(
            ViewState::from_fetch_result(Err(FetchError::Backend("502".to_string()))),
            ViewState::Error(LOAD_FAILED_MESSAGE.to_string())
        );

        assert_eq!(
            ViewState::from_fetch_result(Err(FetchError::Unknown("boom".to_string()))),
            ViewState::Error(UNKNOWN_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_default_is_loading() {
        assert!(ViewState::default().is_loading());
    }
}
