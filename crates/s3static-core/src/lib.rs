//! Core of s3static: serving static websites out of an object store.
//!
//! Every request is served in two steps. The [`DomainResolver`] maps the
//! request host to a tenant [`ServingPolicy`], then the
//! [`PathResolutionEngine`] walks the try-files chain for the request path
//! and either streams an object, renders a directory listing, or reports
//! not-found / upstream failure.
//!
//! # Architecture
//!
//! ```text
//!   SiteConfig (toml / json + env)
//!        |
//!        v
//!   PolicyTable (bucket -> policy, alias -> bucket)
//!        |
//!        v
//!   DomainResolver (Host / X-Forwarded-Host -> ServingPolicy)
//!        |
//!        v
//!   PathResolutionEngine (candidates -> ObjectStore -> Resolution)
//!        |
//!        v
//!   ListingRenderer (HTML index on exhaustion)
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod listing;
pub mod memory;
pub mod path;
pub mod policy;
pub mod resolver;
pub mod store;

pub use config::{BucketPolicyConfig, SiteConfig};
pub use engine::{PathResolutionEngine, Resolution};
pub use error::{ConfigError, RenderError, StoreError};
pub use listing::{HtmlListingRenderer, ListingEntry, ListingRenderer};
pub use memory::MemoryObjectStore;
pub use policy::{DocumentDefaults, PolicyTable, ServingPolicy};
pub use resolver::{DomainMatch, DomainResolver};
pub use store::{ObjectMetadata, ObjectStore, StoredObject};
