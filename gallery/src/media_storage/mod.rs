//! Object storage operations backing the gallery
mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use tracing::debug;

pub use error::{BucketError, BucketResult};

use crate::types::{ObjectKey, SignedUrl};

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in the order the backend returned them
    pub keys: Vec<ObjectKey>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Cursor for the next page, present when truncated
    pub next_continuation_token: Option<String>,
}

/// The two remote operations the gallery needs from object storage
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Lists one page of keys, resuming from `continuation_token` when given
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the listing request fails
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> BucketResult<ListPage>;

    /// Produces a GET URL for `key` valid for `expires_in`
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the URL cannot be signed
    async fn presign_get_url(
        &self,
        bucket: &str,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> BucketResult<SignedUrl>;
}

/// S3-backed object storage
pub struct MediaStorage {
    s3_client: Arc<S3Client>,
}

impl MediaStorage {
    /// Creates a new media storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl ObjectStorage for MediaStorage {
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> BucketResult<ListPage> {
        let output = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token.map(ToString::to_string))
            .send()
            .await?;

        let keys: Vec<ObjectKey> = output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(ObjectKey::from)
            .collect();

        debug!(bucket, keys = keys.len(), "Listed object page");

        Ok(ListPage {
            keys,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(ToString::to_string),
        })
    }

    async fn presign_get_url(
        &self,
        bucket: &str,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> BucketResult<SignedUrl> {
        let presigned_config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
        })?;

        let presigned_request = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key.as_str())
            .presigned(presigned_config)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(SignedUrl::new(presigned_request.uri().to_string()))
    }
}
