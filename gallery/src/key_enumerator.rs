//! Enumerates every key in a bucket by following continuation tokens

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::media_storage::{BucketError, ObjectStorage};
use crate::types::ObjectKey;

/// Errors raised while enumerating a bucket
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A page request failed
    #[error("failed to list page {page} of bucket {bucket}: {source}")]
    ListPage {
        /// Bucket being listed
        bucket: String,
        /// One-based page number of the failing request
        page: usize,
        /// Underlying storage failure
        #[source]
        source: BucketError,
    },

    /// The backend claimed more pages but gave no cursor to fetch them
    #[error("listing of bucket {bucket} is truncated after page {page} but has no continuation token")]
    MissingContinuationToken {
        /// Bucket being listed
        bucket: String,
        /// One-based page number of the offending response
        page: usize,
    },
}

/// Lists all object keys of a bucket
#[derive(Clone)]
pub struct KeyEnumerator {
    storage: Arc<dyn ObjectStorage>,
}

impl KeyEnumerator {
    /// Creates an enumerator over the given storage
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Returns every key in `bucket`, in the order the backend lists them
    ///
    /// Pages are requested one after another, each carrying the previous
    /// response's continuation token. Nothing is returned if any page fails.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ListPage` if a page request fails
    /// Returns `StorageError::MissingContinuationToken` if a truncated page has no cursor
    #[instrument(skip(self))]
    pub async fn list_all_keys(&self, bucket: &str) -> Result<Vec<ObjectKey>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut page = 0;

        loop {
            page += 1;

            let listing = self
                .storage
                .list_objects_page(bucket, continuation_token.as_deref())
                .await
                .map_err(|source| StorageError::ListPage {
                    bucket: bucket.to_string(),
                    page,
                    source,
                })?;

            debug!(page, keys = listing.keys.len(), "Received listing page");
            keys.extend(listing.keys);

            if !listing.is_truncated {
                break;
            }

            match listing.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => {
                    return Err(StorageError::MissingContinuationToken {
                        bucket: bucket.to_string(),
                        page,
                    })
                }
            }
        }

        debug!(pages = page, total = keys.len(), "Enumerated bucket");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_storage::ListPage;
    use crate::testing::InMemoryStorage;
    use pretty_assertions::assert_eq;

    fn keys(names: &[&str]) -> Vec<ObjectKey> {
        names.iter().copied().map(ObjectKey::from).collect()
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let storage = Arc::new(InMemoryStorage::with_keys(
            "photos",
            &["image1.jpg", "image2.png"],
        ));
        let enumerator = KeyEnumerator::new(storage.clone());

        let result = enumerator.list_all_keys("photos").await.unwrap();

        assert_eq!(result, keys(&["image1.jpg", "image2.png"]));
        assert_eq!(storage.list_calls(), vec![None]);
    }

    #[tokio::test]
    async fn test_pages_are_concatenated_in_order() {
        let storage = Arc::new(
            InMemoryStorage::with_keys("photos", &["a", "b", "c", "d", "e"]).with_page_size(2),
        );
        let enumerator = KeyEnumerator::new(storage.clone());

        let result = enumerator.list_all_keys("photos").await.unwrap();

        assert_eq!(result, keys(&["a", "b", "c", "d", "e"]));
        // First request carries no token, later ones carry the previous cursor
        assert_eq!(
            storage.list_calls(),
            vec![None, Some("2".to_string()), Some("4".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_bucket_yields_no_keys() {
        let storage = Arc::new(InMemoryStorage::with_keys("photos", &[]));
        let enumerator = KeyEnumerator::new(storage);

        let result = enumerator.list_all_keys("photos").await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_listing_is_stable() {
        let storage = Arc::new(
            InMemoryStorage::with_keys("photos", &["z.jpg", "a.jpg", "m.jpg"]).with_page_size(1),
        );
        let enumerator = KeyEnumerator::new(storage);

        let first = enumerator.list_all_keys("photos").await.unwrap();
        let second = enumerator.list_all_keys("photos").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failure_on_later_page_returns_nothing() {
        let storage = Arc::new(
            InMemoryStorage::with_keys("photos", &["a", "b", "c", "d"])
                .with_page_size(2)
                .fail_listing_at_page(2),
        );
        let enumerator = KeyEnumerator::new(storage);

        let result = enumerator.list_all_keys("photos").await;

        match result {
            Err(StorageError::ListPage { bucket, page, .. }) => {
                assert_eq!(bucket, "photos");
                assert_eq!(page, 2);
            }
            other => panic!("expected a page failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_page_without_token_is_an_error() {
        let storage = Arc::new(InMemoryStorage::with_pages(vec![ListPage {
            keys: keys(&["a"]),
            is_truncated: true,
            next_continuation_token: None,
        }]));
        let enumerator = KeyEnumerator::new(storage);

        let result = enumerator.list_all_keys("photos").await;

        assert_eq!(
            result,
            Err(StorageError::MissingContinuationToken {
                bucket: "photos".to_string(),
                page: 1,
            })
        );
    }
}
