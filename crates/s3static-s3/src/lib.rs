//! S3-compatible object store for s3static, built on `aws-sdk-s3`.
//!
//! [`S3ObjectStore`] implements [`s3static_core::ObjectStore`]:
//!
//! - `fetch_object` → `GetObject`, body streamed as the SDK yields it.
//! - `list_objects` → paginated `ListObjectsV2` with delimiter `/`, common
//!   prefixes first on every page.
//!
//! SDK failures are mapped onto [`s3static_core::StoreError`] by [`error`].

pub mod config;
pub mod error;
pub mod store;

pub use config::S3StoreConfig;
pub use store::S3ObjectStore;
