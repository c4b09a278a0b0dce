//! Object store abstraction.
//!
//! The engine talks to storage only through [`ObjectStore`]. Two operations
//! are needed:
//!
//! - [`fetch_object`](ObjectStore::fetch_object): metadata plus a streaming
//!   body for one key.
//! - [`list_objects`](ObjectStore::list_objects): a lazy stream of keys and
//!   common prefixes directly under a prefix (delimiter `/`).
//!
//! Bodies are streams, never buffers. Dropping a [`StoredObject`] (or its
//! body) releases the underlying connection.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::{StoreError, StoreResult};

/// Streaming object body.
pub type ObjectBody = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Lazy stream of listed keys.
pub type KeyStream = BoxStream<'static, StoreResult<String>>;

/// Response metadata of a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// `Content-Type` of the object.
    pub content_type: Option<String>,
    /// Entity tag, quoted as the store returns it.
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Body length in bytes, when known.
    pub content_length: Option<u64>,
}

/// A fetched object: metadata plus a body that is consumed once.
pub struct StoredObject {
    /// The key the object was fetched from.
    pub key: String,
    /// Response metadata.
    pub metadata: ObjectMetadata,
    /// Streaming body.
    pub body: ObjectBody,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("key", &self.key)
            .field("metadata", &self.metadata)
            .field("body", &"...")
            .finish()
    }
}

/// Read access to a bucket-organized object store.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch one object.
    ///
    /// A missing key must be reported with the `NoSuchKey` code
    /// (see [`StoreError::no_such_key`]).
    async fn fetch_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject>;

    /// List keys and common prefixes directly under `prefix`.
    ///
    /// Order is whatever the store returns. A failure ends the stream after
    /// yielding the error.
    fn list_objects(&self, bucket: &str, prefix: &str) -> KeyStream;
}

/// Shorthand for an error-only key stream.
#[must_use]
pub fn failed_listing(err: StoreError) -> KeyStream {
    Box::pin(futures::stream::once(async move { Err(err) }))
}
