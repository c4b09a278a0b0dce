//! Connection settings for the S3 store.

use s3static_core::SiteConfig;

/// Settings used to build an [`S3ObjectStore`](crate::S3ObjectStore).
#[derive(Clone, PartialEq, Eq)]
pub struct S3StoreConfig {
    /// `host[:port]` or a full URL.
    pub endpoint: String,
    /// Use https when `endpoint` has no scheme.
    pub secure: bool,
    /// Signing region.
    pub region: String,
    /// Static access key.
    pub access_key: Option<String>,
    /// Static secret key.
    pub secret_key: Option<String>,
    /// Path-style bucket addressing.
    pub force_path_style: bool,
}

impl std::fmt::Debug for S3StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("secure", &self.secure)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "..."))
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl S3StoreConfig {
    /// The endpoint as a URL, adding a scheme when it has none.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            return endpoint.to_owned();
        }
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{endpoint}")
    }

    /// Static credentials, when both halves are configured.
    #[must_use]
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) if !access.is_empty() => Some((access, secret)),
            _ => None,
        }
    }
}

impl From<&SiteConfig> for S3StoreConfig {
    fn from(config: &SiteConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            secure: config.secure,
            region: config.region.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            force_path_style: config.force_path_style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str, secure: bool) -> S3StoreConfig {
        S3StoreConfig::from(
            &SiteConfig::builder()
                .endpoint(endpoint)
                .secure(secure)
                .domains(vec!["example.com".to_owned()])
                .build(),
        )
    }

    #[test]
    fn test_should_add_scheme_to_bare_endpoint() {
        assert_eq!(config("minio:9000", false).endpoint_url(), "http://minio:9000");
        assert_eq!(config("minio:9000", true).endpoint_url(), "https://minio:9000");
    }

    #[test]
    fn test_should_keep_explicit_scheme() {
        assert_eq!(
            config("https://s3.amazonaws.com/", false).endpoint_url(),
            "https://s3.amazonaws.com"
        );
    }

    #[test]
    fn test_should_require_both_credential_halves() {
        let mut cfg = config("minio:9000", false);
        assert!(cfg.static_credentials().is_none());
        cfg.access_key = Some("ak".to_owned());
        assert!(cfg.static_credentials().is_none());
        cfg.secret_key = Some("sk".to_owned());
        assert_eq!(cfg.static_credentials(), Some(("ak", "sk")));
    }

    #[test]
    fn test_should_redact_secret_in_debug() {
        let mut cfg = config("minio:9000", false);
        cfg.secret_key = Some("hunter2".to_owned());
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("hunter2"));
    }
}
