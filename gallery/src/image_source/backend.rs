use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{FetchError, ImageSource};
use crate::types::SignedUrl;

/// Fetches ready-made URLs from a backend with a single GET
///
/// The endpoint must answer with a JSON array of URL strings. A `null` body
/// counts as no images.
pub struct BackendImageSource {
    client: reqwest::Client,
    endpoint: String,
}

impl BackendImageSource {
    /// Creates a source calling `endpoint`
    #[must_use]
    pub const fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    /// The endpoint this source calls
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageSource for BackendImageSource {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_image_urls(&self) -> Result<Vec<SignedUrl>, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Backend(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Backend(format!(
                "Failed to fetch images from backend. (status {status})"
            )));
        }

        let urls: Option<Vec<SignedUrl>> = response
            .json()
            .await
            .map_err(|e| FetchError::Backend(format!("invalid response body: {e}")))?;
        let urls = urls.unwrap_or_default();

        debug!(urls = urls.len(), "Fetched image URLs from backend");
        Ok(urls)
    }
}
