//! HTTP layer for s3static.
//!
//! - **Service** ([`service`]): [`StaticSiteService`](service::StaticSiteService),
//!   a hyper `Service` that resolves the host, runs the try-files chain and
//!   builds the response.
//! - **Response** ([`response`]): outcome → status, headers and body.
//! - **Body** ([`body`]): [`SiteBody`](body::SiteBody), buffered or streamed.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> StaticSiteService (hyper Service)
//!     -> Health check interception
//!     -> DomainResolver (Host / X-Forwarded-Host)
//!     -> PathResolutionEngine (try-files chain, listing)
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use s3static_core::{DomainResolver, MemoryObjectStore, PathResolutionEngine, PolicyTable};
//! use s3static_http::StaticSiteService;
//!
//! let table = Arc::new(PolicyTable::default());
//! let resolver = Arc::new(DomainResolver::new(table, true));
//! let engine = PathResolutionEngine::new(Arc::new(MemoryObjectStore::new()));
//! let service = StaticSiteService::new(resolver, engine);
//! // Use `service` with a hyper server.
//! ```

pub mod body;
pub mod response;
pub mod service;

pub use body::SiteBody;
pub use service::{HEALTH_PATH, StaticSiteService};
