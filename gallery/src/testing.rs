//! In-memory collaborators for tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::image_source::{FetchError, ImageSource};
use crate::media_storage::{BucketError, BucketResult, ListPage, ObjectStorage};
use crate::types::{ObjectKey, SignedUrl};

const DEFAULT_PAGE_SIZE: usize = 1000;

enum Listing {
    Keys {
        keys: Vec<ObjectKey>,
        page_size: usize,
    },
    Pages(Vec<ListPage>),
}

/// Object storage backed by a fixed key list
///
/// Continuation tokens are the stringified offset of the next key. Signed URLs
/// are deterministic, see [`InMemoryStorage::url_for`].
pub struct InMemoryStorage {
    bucket: Option<String>,
    listing: Listing,
    fail_listing_at_page: Option<usize>,
    failing_keys: HashSet<String>,
    signing_delays: HashMap<String, Duration>,
    list_calls: Mutex<Vec<Option<String>>>,
    presign_calls: AtomicUsize,
}

impl InMemoryStorage {
    /// Storage holding `keys` in `bucket`
    #[must_use]
    pub fn with_keys(bucket: &str, keys: &[&str]) -> Self {
        Self::new(
            Some(bucket.to_string()),
            Listing::Keys {
                keys: keys.iter().copied().map(ObjectKey::from).collect(),
                page_size: DEFAULT_PAGE_SIZE,
            },
        )
    }

    /// Storage replaying the given pages for any bucket
    ///
    /// The first request gets `pages[0]`; a request carrying token `t` gets
    /// the page following the one whose `next_continuation_token` is `t`.
    #[must_use]
    pub fn with_pages(pages: Vec<ListPage>) -> Self {
        Self::new(None, Listing::Pages(pages))
    }

    fn new(bucket: Option<String>, listing: Listing) -> Self {
        Self {
            bucket,
            listing,
            fail_listing_at_page: None,
            failing_keys: HashSet::new(),
            signing_delays: HashMap::new(),
            list_calls: Mutex::new(Vec::new()),
            presign_calls: AtomicUsize::new(0),
        }
    }

    /// Splits the key list into pages of `page_size`
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero or the storage was built from explicit pages
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        match &mut self.listing {
            Listing::Keys { page_size: size, .. } => *size = page_size,
            Listing::Pages(_) => panic!("page size only applies to key listings"),
        }
        self
    }

    /// Makes the one-based `page` of every listing fail
    #[must_use]
    pub fn fail_listing_at_page(mut self, page: usize) -> Self {
        self.fail_listing_at_page = Some(page);
        self
    }

    /// Makes signing `key` fail
    #[must_use]
    pub fn fail_signing(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Delays the signing response for `key`
    #[must_use]
    pub fn with_signing_delay(mut self, key: &str, delay: Duration) -> Self {
        self.signing_delays.insert(key.to_string(), delay);
        self
    }

    /// The URL this storage signs for `key`
    #[must_use]
    pub fn url_for(bucket: &str, key: &ObjectKey, expires_in: Duration) -> SignedUrl {
        SignedUrl::new(format!(
            "https://{bucket}.storage.test/{key}?expires={}",
            expires_in.as_secs()
        ))
    }

    /// Continuation tokens received by each listing request, in call order
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned
    #[must_use]
    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.list_calls.lock().expect("list call log poisoned").clone()
    }

    /// Number of signing requests received
    #[must_use]
    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }

    fn page_for(&self, continuation_token: Option<&str>) -> BucketResult<(usize, ListPage)> {
        match &self.listing {
            Listing::Keys { keys, page_size } => {
                let offset = match continuation_token {
                    None => 0,
                    Some(token) => token.parse::<usize>().map_err(|_| {
                        BucketError::S3Error(format!("InvalidArgument: bad token {token}"))
                    })?,
                };
                let end = (offset + page_size).min(keys.len());
                let is_truncated = end < keys.len();

                Ok((
                    offset / page_size + 1,
                    ListPage {
                        keys: keys.get(offset..end).unwrap_or_default().to_vec(),
                        is_truncated,
                        next_continuation_token: is_truncated.then(|| end.to_string()),
                    },
                ))
            }
            Listing::Pages(pages) => {
                let index = match continuation_token {
                    None => 0,
                    Some(token) => pages
                        .iter()
                        .position(|page| page.next_continuation_token.as_deref() == Some(token))
                        .map(|previous| previous + 1)
                        .ok_or_else(|| {
                            BucketError::S3Error(format!("InvalidArgument: bad token {token}"))
                        })?,
                };

                let page = pages.get(index).cloned().unwrap_or_default();
                Ok((index + 1, page))
            }
        }
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> BucketResult<ListPage> {
        self.list_calls
            .lock()
            .expect("list call log poisoned")
            .push(continuation_token.map(ToString::to_string));

        if self.bucket.as_deref().is_some_and(|expected| expected != bucket) {
            return Err(BucketError::S3Error(format!("NoSuchBucket: {bucket}")));
        }

        let (page_number, page) = self.page_for(continuation_token)?;

        if self.fail_listing_at_page == Some(page_number) {
            return Err(BucketError::UpstreamError(format!(
                "InternalError on page {page_number}"
            )));
        }

        Ok(page)
    }

    async fn presign_get_url(
        &self,
        bucket: &str,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> BucketResult<SignedUrl> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.signing_delays.get(key.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing_keys.contains(key.as_str()) {
            return Err(BucketError::S3Error(format!("AccessDenied: {key}")));
        }

        Ok(Self::url_for(bucket, key, expires_in))
    }
}

/// One scripted answer of a [`ScriptedImageSource`]
pub enum Scripted {
    /// Resolve after `delay` with `result`
    After {
        /// Time to wait before answering
        delay: Duration,
        /// The answer
        result: Result<Vec<SignedUrl>, FetchError>,
    },
    /// Never resolve
    Pending,
    /// Panic inside the fetch
    Panic,
}

impl Scripted {
    /// Immediately resolve with `result`
    #[must_use]
    pub fn now(result: Result<Vec<SignedUrl>, FetchError>) -> Self {
        Self::After {
            delay: Duration::ZERO,
            result,
        }
    }

    /// Immediately resolve with the given URLs
    #[must_use]
    pub fn urls(urls: &[&str]) -> Self {
        Self::now(Ok(urls.iter().copied().map(SignedUrl::from).collect()))
    }
}

/// Image source answering each fetch with the next scripted response
///
/// Once the script is exhausted every further fetch stays pending.
pub struct ScriptedImageSource {
    script: Mutex<VecDeque<Scripted>>,
    fetches: AtomicUsize,
}

impl ScriptedImageSource {
    /// A source replaying `script` in order
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of fetches started so far
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSource for ScriptedImageSource {
    async fn fetch_image_urls(&self) -> Result<Vec<SignedUrl>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or(Scripted::Pending);

        match next {
            Scripted::After { delay, result } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            Scripted::Pending => futures::future::pending().await,
            Scripted::Panic => panic!("scripted image source panicked"),
        }
    }
}
