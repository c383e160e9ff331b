//! Derives time-limited GET URLs for a batch of object keys

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::media_storage::{BucketError, ObjectStorage};
use crate::types::{ObjectKey, SignedUrl};

/// Longest validity window S3 accepts for a presigned URL
pub const MAX_PRESIGNED_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Errors raised while signing URLs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The requested validity window cannot be expressed
    #[error("invalid presigned URL expiry {0:?}: must be between 1 second and 7 days")]
    InvalidExpiry(Duration),

    /// Signing one of the keys failed
    #[error("failed to sign URL for {key} in bucket {bucket}: {source}")]
    SignKey {
        /// Bucket holding the object
        bucket: String,
        /// Key whose URL could not be produced
        key: ObjectKey,
        /// Underlying storage failure
        #[source]
        source: BucketError,
    },
}

/// Signs GET URLs with a fixed validity window
#[derive(Clone)]
pub struct UrlSigner {
    storage: Arc<dyn ObjectStorage>,
    expires_in: Duration,
}

impl UrlSigner {
    /// Creates a signer producing URLs valid for `expires_in`
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, expires_in: Duration) -> Self {
        Self {
            storage,
            expires_in,
        }
    }

    /// The validity window applied by [`UrlSigner::sign_urls`]
    #[must_use]
    pub const fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Signs one URL per key using the configured validity window
    ///
    /// # Errors
    ///
    /// See [`UrlSigner::sign_urls_with_expiry`]
    pub async fn sign_urls(
        &self,
        bucket: &str,
        keys: &[ObjectKey],
    ) -> Result<Vec<SignedUrl>, SigningError> {
        self.sign_urls_with_expiry(bucket, keys, self.expires_in)
            .await
    }

    /// Signs one URL per key, all requests in flight at once
    ///
    /// The output has the same length and order as `keys`. The first failing
    /// request fails the whole batch and the remaining requests are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SigningError::InvalidExpiry` if `expires_in` is zero or longer than 7 days
    /// Returns `SigningError::SignKey` if any key cannot be signed
    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    pub async fn sign_urls_with_expiry(
        &self,
        bucket: &str,
        keys: &[ObjectKey],
        expires_in: Duration,
    ) -> Result<Vec<SignedUrl>, SigningError> {
        if expires_in.is_zero() || expires_in > MAX_PRESIGNED_URL_EXPIRY {
            return Err(SigningError::InvalidExpiry(expires_in));
        }

        let requests = keys.iter().map(|key| async move {
            self.storage
                .presign_get_url(bucket, key, expires_in)
                .await
                .map_err(|source| SigningError::SignKey {
                    bucket: bucket.to_string(),
                    key: key.clone(),
                    source,
                })
        });

        let urls = try_join_all(requests).await?;

        debug!(
            signed = urls.len(),
            expires_in_secs = expires_in.as_secs(),
            "Signed object URLs"
        );
        Ok(urls)
    }
}
