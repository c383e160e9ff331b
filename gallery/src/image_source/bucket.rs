use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{FetchError, ImageSource};
use crate::key_enumerator::KeyEnumerator;
use crate::types::SignedUrl;
use crate::url_signer::UrlSigner;

/// Lists a bucket, then signs a GET URL for every key
pub struct BucketImageSource {
    bucket_name: String,
    enumerator: KeyEnumerator,
    signer: UrlSigner,
}

impl BucketImageSource {
    /// Creates a source over `bucket_name`
    #[must_use]
    pub const fn new(bucket_name: String, enumerator: KeyEnumerator, signer: UrlSigner) -> Self {
        Self {
            bucket_name,
            enumerator,
            signer,
        }
    }

    /// The bucket this source lists
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl ImageSource for BucketImageSource {
    #[instrument(skip(self), fields(bucket = %self.bucket_name))]
    async fn fetch_image_urls(&self) -> Result<Vec<SignedUrl>, FetchError> {
        let keys = self.enumerator.list_all_keys(&self.bucket_name).await?;
        debug!(keys = keys.len(), "Enumerated keys, signing URLs");

        let urls = self.signer.sign_urls(&self.bucket_name, &keys).await?;
        Ok(urls)
    }
}
