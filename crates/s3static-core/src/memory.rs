//! In-memory [`ObjectStore`] for tests and local development.
//!
//! Objects live in a [`DashMap`] keyed by `(bucket, key)`. Errors can be
//! injected per key or per listing, and the store records every fetch and
//! tracks how many bodies are still open so callers can verify the
//! try-files chain releases what it does not serve.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::store::{KeyStream, ObjectMetadata, ObjectStore, StoredObject, failed_listing};

/// Body chunk size handed out by [`MemoryObjectStore`].
const CHUNK_SIZE: usize = 8 * 1024;

type ObjectKey = (String, String);

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// Decrements the open-body counter when the body stream is dropped.
#[derive(Debug)]
struct BodyGuard(Arc<AtomicUsize>);

impl BodyGuard {
    fn open(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for BodyGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Thread-safe in-memory object store.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<ObjectKey, MemoryObject>,
    fetch_failures: DashMap<ObjectKey, StoreError>,
    listing_failures: DashMap<String, StoreError>,
    fetch_log: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    open_bodies: Arc<AtomicUsize>,
}

impl MemoryObjectStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with the given content type.
    pub fn put(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: &str,
    ) -> &Self {
        self.put_at(bucket, key, data, content_type, Utc::now())
    }

    /// Store an object with an explicit modification time.
    pub fn put_at(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: &str,
        last_modified: DateTime<Utc>,
    ) -> &Self {
        let object = MemoryObject {
            data: data.into(),
            content_type: content_type.to_owned(),
            etag: format!("\"{}\"", uuid::Uuid::new_v4().simple()),
            last_modified,
        };
        self.objects
            .insert((bucket.to_owned(), key.to_owned()), object);
        self
    }

    /// Make every fetch of `bucket/key` fail with `err`.
    pub fn fail_fetch(&self, bucket: &str, key: &str, err: StoreError) -> &Self {
        self.fetch_failures
            .insert((bucket.to_owned(), key.to_owned()), err);
        self
    }

    /// Make every listing of `bucket` fail with `err`.
    pub fn fail_listing(&self, bucket: &str, err: StoreError) -> &Self {
        self.listing_failures.insert(bucket.to_owned(), err);
        self
    }

    /// Keys fetched so far (`bucket/key`), in call order.
    #[must_use]
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetch_log.lock().clone()
    }

    /// Number of listing calls so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of bodies handed out and not yet dropped.
    #[must_use]
    pub fn open_bodies(&self) -> usize {
        self.open_bodies.load(Ordering::SeqCst)
    }

    /// The etag assigned to a stored object.
    #[must_use]
    pub fn etag(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|o| o.etag.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn fetch_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
        self.fetch_log.lock().push(format!("{bucket}/{key}"));
        trace!(bucket, key, "memory store fetch");

        let id = (bucket.to_owned(), key.to_owned());
        if let Some(err) = self.fetch_failures.get(&id) {
            return Err(err.value().clone());
        }
        let object = self
            .objects
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::no_such_key(key))?;

        let guard = BodyGuard::open(&self.open_bodies);
        let chunks: Vec<Bytes> = object
            .data
            .chunks(CHUNK_SIZE)
            .map(|chunk| object.data.slice_ref(chunk))
            .collect();
        let body = futures::stream::iter(chunks)
            .map(move |chunk| {
                let _held = &guard;
                Ok::<_, std::io::Error>(chunk)
            })
            .boxed();

        Ok(StoredObject {
            key: key.to_owned(),
            metadata: ObjectMetadata {
                content_type: Some(object.content_type),
                etag: Some(object.etag),
                last_modified: Some(object.last_modified),
                content_length: u64::try_from(object.data.len()).ok(),
            },
            body,
        })
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> KeyStream {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.listing_failures.get(bucket) {
            return failed_listing(err.value().clone());
        }

        let mut entries = BTreeSet::new();
        for entry in &self.objects {
            let (entry_bucket, key) = entry.key();
            if entry_bucket != bucket {
                continue;
            }
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            match rest.find('/') {
                Some(pos) if pos + 1 < rest.len() => {
                    entries.insert(format!("{prefix}{}", &rest[..=pos]));
                }
                _ => {
                    entries.insert(key.clone());
                }
            }
        }

        futures::stream::iter(entries.into_iter().map(Ok)).boxed()
    }
}
