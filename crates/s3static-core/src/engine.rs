//! The try-files path resolution engine.
//!
//! Given a [`ServingPolicy`] and a request path, the engine walks the
//! candidate keys from [`candidate_keys`] strictly in order:
//!
//! ```text
//! Trying(0) --missing--> Trying(1) --missing--> ... --> MissingExhausted
//!     |                      |
//!   found                 found            other error at any step --> Fatal
//!     v                      v
//!  Success                Success
//! ```
//!
//! `MissingExhausted` becomes a directory listing for directory-style paths
//! when the policy allows it, and [`Resolution::NotFound`] otherwise.
//!
//! The engine keeps no per-request state and is shared across all requests.
//! Cancellation is drop-based: dropping the future returned by
//! [`PathResolutionEngine::resolve`] drops any in-flight store call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use s3static_core::{MemoryObjectStore, PathResolutionEngine, Resolution, ServingPolicy};
//!
//! let store = Arc::new(MemoryObjectStore::new());
//! store.put("site", "404.html", "gone", "text/html");
//! let engine = PathResolutionEngine::new(store);
//! let policy = ServingPolicy::new("site")
//!     .with_index_document("index.html")
//!     .with_error_document("404.html");
//!
//! let resolution = tokio_test::block_on(engine.resolve(&policy, "/blog/")).unwrap();
//! assert!(matches!(resolution, Resolution::Object(ref object) if object.key == "404.html"));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::{RenderError, StoreError, StoreResult};
use crate::listing::{HtmlListingRenderer, ListingEntry, ListingRenderer};
use crate::path::{candidate_keys, is_directory_style, join_and_normalize};
use crate::policy::ServingPolicy;
use crate::store::{ObjectStore, StoredObject};

/// Final outcome of resolving one request.
#[derive(Debug)]
pub enum Resolution {
    /// A candidate was found; stream it.
    Object(StoredObject),
    /// Every candidate was missing and a listing was rendered.
    Listing {
        /// The listed prefix.
        prefix: String,
        /// Rendered HTML document.
        html: String,
    },
    /// Every candidate was missing and no listing applies.
    NotFound,
    /// The store failed with something other than a missing key.
    Upstream {
        /// The key (or listing prefix) being accessed.
        key: String,
        /// The store's error.
        error: StoreError,
    },
}

impl Resolution {
    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Listing { .. } => "listing",
            Self::NotFound => "not_found",
            Self::Upstream { .. } => "upstream_error",
        }
    }
}

/// Resolves request paths against an [`ObjectStore`].
#[derive(Debug)]
pub struct PathResolutionEngine<S: ?Sized, R: ?Sized = HtmlListingRenderer> {
    store: Arc<S>,
    renderer: Arc<R>,
    upstream_timeout: Option<Duration>,
}

impl<S: ?Sized, R: ?Sized> Clone for PathResolutionEngine<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            renderer: Arc::clone(&self.renderer),
            upstream_timeout: self.upstream_timeout,
        }
    }
}

impl<S: ObjectStore + ?Sized> PathResolutionEngine<S> {
    /// Create an engine using the default HTML renderer.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_renderer(store, Arc::new(HtmlListingRenderer))
    }
}

impl<S, R> PathResolutionEngine<S, R>
where
    S: ObjectStore + ?Sized,
    R: ListingRenderer + ?Sized,
{
    /// Create an engine with a custom listing renderer.
    #[must_use]
    pub fn with_renderer(store: Arc<S>, renderer: Arc<R>) -> Self {
        Self {
            store,
            renderer,
            upstream_timeout: None,
        }
    }

    /// Bound every store call by `timeout`.
    #[must_use]
    pub fn with_upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Resolve `request_path` for `policy`.
    ///
    /// Only a listing render failure is an `Err`; every other outcome,
    /// including upstream failures, is a [`Resolution`].
    pub async fn resolve(
        &self,
        policy: &ServingPolicy,
        request_path: &str,
    ) -> Result<Resolution, RenderError> {
        let bucket = policy.bucket.as_str();

        for key in candidate_keys(policy, request_path) {
            // No object can live at the empty key.
            if key.is_empty() {
                debug!(bucket, path = %request_path, "empty candidate key, trying next");
                continue;
            }
            match self.bounded(self.store.fetch_object(bucket, &key)).await {
                Ok(object) => {
                    debug!(bucket, key = %key, "candidate found");
                    return Ok(Resolution::Object(object));
                }
                Err(err) if err.is_missing_object() => {
                    debug!(bucket, key = %key, "candidate missing, trying next");
                }
                Err(err) => {
                    warn!(
                        bucket,
                        key = %key,
                        code = %err.code,
                        status = %err.status,
                        error = %err.message,
                        "upstream error"
                    );
                    return Ok(Resolution::Upstream { key, error: err });
                }
            }
        }

        if !(is_directory_style(request_path) && policy.allow_listing) {
            return Ok(Resolution::NotFound);
        }

        let prefix = join_and_normalize(&[request_path]);
        let entries = match self.list_directory(bucket, &prefix).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    bucket,
                    prefix = %prefix,
                    code = %err.code,
                    error = %err.message,
                    "upstream error while listing"
                );
                return Ok(Resolution::Upstream {
                    key: prefix,
                    error: err,
                });
            }
        };

        let html = self
            .renderer
            .render(bucket, &prefix, &entries)
            .inspect_err(|err| {
                tracing::error!(bucket, prefix = %prefix, error = %err, "render directory error");
            })?;
        Ok(Resolution::Listing { prefix, html })
    }

    /// List the entries directly under `prefix` with one listing call.
    ///
    /// Entries keep the store's order; the renderer decides presentation.
    pub async fn list_directory(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<ListingEntry>> {
        let mut keys = self.store.list_objects(bucket, prefix);
        let mut entries = Vec::new();
        while let Some(key) = self.bounded(async { keys.next().await.transpose() }).await? {
            if let Some(entry) = ListingEntry::from_key(prefix, &key) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn bounded<F, T>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.upstream_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .unwrap_or_else(|_| Err(StoreError::timeout())),
            None => fut.await,
        }
    }
}
