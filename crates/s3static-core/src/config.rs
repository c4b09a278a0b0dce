//! Site configuration.
//!
//! Provides [`SiteConfig`], loaded from a TOML (or JSON) file with
//! environment-variable overrides, and [`BucketPolicyConfig`], the
//! configuration form of one tenant's serving policy.
//!
//! # Example
//!
//! ```toml
//! endpoint = "minio.internal:9000"
//! domains = ["sites.example.com"]
//! default_index_document = "index.html"
//!
//! [[policies]]
//! bucket = "blog"
//! domain_alias = ["blog.example.org"]
//! error_document = "404.html"
//! allow_listing = true
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};

/// Process-wide configuration.
///
/// All fields except `endpoint` and `domains` have defaults. Configuration is
/// read with [`SiteConfig::from_file`], which also applies environment
/// overrides and validates the result.
///
/// # Examples
///
/// ```
/// use s3static_core::config::SiteConfig;
///
/// let config = SiteConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:80");
/// assert_eq!(config.default_index_document, "index.html");
/// assert!(config.trust_forwarded_host);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct SiteConfig {
    /// Bind address for the HTTP listener.
    #[builder(default = String::from("0.0.0.0:80"))]
    pub listen: String,

    /// Port override for `listen`.
    #[builder(default, setter(strip_option))]
    pub http_port: Option<u16>,

    /// Object store endpoint, either `host[:port]` or a full URL.
    #[builder(default, setter(into))]
    pub endpoint: String,

    /// Use https when `endpoint` carries no scheme.
    #[builder(default = false)]
    pub secure: bool,

    /// Signing region.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Static access key. When unset the default credential chain is used.
    #[builder(default, setter(strip_option, into))]
    pub access_key: Option<String>,

    /// Static secret key.
    #[builder(default, setter(strip_option, into))]
    pub secret_key: Option<String>,

    /// Use path-style bucket addressing against the store.
    #[builder(default = true)]
    pub force_path_style: bool,

    /// Root domains, tried in order during suffix matching.
    #[builder(default)]
    pub domains: Vec<String>,

    /// Index document applied to policies that do not set one.
    #[builder(default = String::from("index.html"))]
    pub default_index_document: String,

    /// Error document applied to policies that do not set one.
    #[builder(default)]
    pub default_error_document: String,

    /// Whether `X-Forwarded-Host` takes precedence over `Host`.
    #[builder(default = true)]
    pub trust_forwarded_host: bool,

    /// Per-call upstream timeout in seconds.
    #[builder(default, setter(strip_option))]
    pub upstream_timeout_secs: Option<u64>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Per-bucket serving policies.
    #[builder(default)]
    pub policies: Vec<BucketPolicyConfig>,
}

/// Configuration of one tenant bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct BucketPolicyConfig {
    /// Bucket name. Must be non-empty.
    #[builder(setter(into))]
    pub bucket: String,

    /// Full hostnames routed to this bucket.
    #[builder(default)]
    pub domain_alias: Vec<String>,

    /// Bucket-name aliases; each becomes `<alias>.<root>` for every root domain.
    #[builder(default)]
    pub bucket_alias: Vec<String>,

    /// Index document; empty means "use the process default".
    #[builder(default, setter(into))]
    pub index_document: String,

    /// Error document; empty means "use the process default".
    #[builder(default, setter(into))]
    pub error_document: String,

    /// Render a directory listing when nothing else matches.
    #[builder(default = false)]
    pub allow_listing: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            listen: String::from("0.0.0.0:80"),
            http_port: None,
            endpoint: String::new(),
            secure: false,
            region: String::from("us-east-1"),
            access_key: None,
            secret_key: None,
            force_path_style: true,
            domains: Vec::new(),
            default_index_document: String::from("index.html"),
            default_error_document: String::new(),
            trust_forwarded_host: true,
            upstream_timeout_secs: None,
            log_level: String::from("info"),
            policies: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Load, override from the environment, and validate a config file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Does not validate.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON document. Does not validate.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `S3STATIC_LISTEN` | `listen` |
    /// | `S3STATIC_ENDPOINT` | `endpoint` |
    /// | `S3STATIC_SECURE` | `secure` |
    /// | `S3STATIC_REGION` | `region` |
    /// | `S3STATIC_ACCESS_KEY` | `access_key` |
    /// | `S3STATIC_SECRET_KEY` | `secret_key` |
    /// | `S3STATIC_DOMAINS` | `domains` (comma-separated) |
    /// | `LOG_LEVEL` | `log_level` |
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("S3STATIC_LISTEN") {
            self.listen = v;
        }
        if let Some(v) = lookup("S3STATIC_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("S3STATIC_SECURE") {
            self.secure = parse_bool(&v);
        }
        if let Some(v) = lookup("S3STATIC_REGION") {
            self.region = v;
        }
        if let Some(v) = lookup("S3STATIC_ACCESS_KEY") {
            self.access_key = Some(v);
        }
        if let Some(v) = lookup("S3STATIC_SECRET_KEY") {
            self.secret_key = Some(v);
        }
        if let Some(v) = lookup("S3STATIC_DOMAINS") {
            self.domains = v
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// Check required fields.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("config endpoint empty".to_owned()));
        }
        if self.domains.iter().all(|d| d.trim().is_empty()) {
            return Err(ConfigError::Invalid("config domains empty".to_owned()));
        }
        if let Some(policy) = self.policies.iter().find(|p| p.bucket.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "config bucket policy with empty bucket name (aliases: {:?})",
                policy.domain_alias
            )));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// The socket address to bind, with `http_port` applied.
    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        let mut addr: SocketAddr = self
            .listen
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid listen address {}: {e}", self.listen)))?;
        if let Some(port) = self.http_port {
            addr.set_port(port);
        }
        Ok(addr)
    }

    /// The per-call upstream timeout, if configured.
    #[must_use]
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
