//! Error types for s3static.
//!
//! Three families of errors flow through the core:
//!
//! - [`StoreError`]: anything the object store reports. The engine only
//!   special-cases the [`NO_SUCH_KEY`] code ("missing object"); every other
//!   code is fatal for the request and surfaced to the client with the
//!   store's status code and message.
//! - [`RenderError`]: the listing renderer failed. Surfaced as a generic
//!   internal error, never with the renderer's details.
//! - [`ConfigError`]: startup-time configuration problems.
//!
//! # Usage
//!
//! ```
//! use s3static_core::error::StoreError;
//!
//! let err = StoreError::no_such_key("blog/index.html");
//! assert!(err.is_missing_object());
//! assert_eq!(err.status, http::StatusCode::NOT_FOUND);
//! ```

use std::path::PathBuf;

use http::StatusCode;

/// Store error code reported for a missing object.
pub const NO_SUCH_KEY: &str = "NoSuchKey";

/// Store error code used when an upstream call exceeds the configured timeout.
pub const REQUEST_TIMEOUT: &str = "RequestTimeout";

/// Store error code used when the store could not be reached at all.
pub const UPSTREAM_UNAVAILABLE: &str = "UpstreamUnavailable";

/// Error reported by an [`ObjectStore`](crate::store::ObjectStore).
///
/// Carries the store-defined machine-readable `code`, the HTTP status the
/// store associated with it, and a human-readable message that is safe to
/// return to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code} ({status}): {message}")]
pub struct StoreError {
    /// Store-defined error code (e.g. `NoSuchKey`, `AccessDenied`).
    pub code: String,
    /// HTTP status code the store associated with the error.
    pub status: StatusCode,
    /// Human-readable message.
    pub message: String,
}

impl StoreError {
    /// Create a store error from its parts.
    #[must_use]
    pub fn new(code: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status,
            message: message.into(),
        }
    }

    /// The specified key does not exist.
    #[must_use]
    pub fn no_such_key(key: &str) -> Self {
        Self::new(
            NO_SUCH_KEY,
            StatusCode::NOT_FOUND,
            format!("The specified key does not exist: {key}"),
        )
    }

    /// The upstream call did not complete within the configured timeout.
    #[must_use]
    pub fn timeout() -> Self {
        Self::new(
            REQUEST_TIMEOUT,
            StatusCode::GATEWAY_TIMEOUT,
            "upstream request timed out",
        )
    }

    /// The store could not be reached or returned no parseable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(UPSTREAM_UNAVAILABLE, StatusCode::BAD_GATEWAY, message)
    }

    /// Whether this error means "the key is absent", i.e. try the next candidate.
    #[must_use]
    pub fn is_missing_object(&self) -> bool {
        self.code == NO_SUCH_KEY
    }
}

/// The directory listing could not be rendered.
#[derive(Debug, thiserror::Error)]
#[error("failed to render directory listing: {0}")]
pub struct RenderError(pub String);

/// Configuration loading or validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration file is not valid JSON.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A field is missing or has an invalid value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience result type for object store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
