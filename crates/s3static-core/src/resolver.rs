//! Hostname → serving policy resolution.
//!
//! Resolution is a three-step ordered strategy over the read-only
//! [`PolicyTable`]:
//!
//! 1. **Alias**: the host is looked up directly in the alias table.
//! 2. **Suffix**: for each root domain `d` in configured order, a host ending
//!    in `.d` yields the bucket name in front of it. A bucket without explicit
//!    configuration still resolves, to a synthesized minimal policy.
//! 3. **No match**: nothing applied.
//!
//! Every returned policy is a patched copy; the table itself is never touched.
//!
//! ```text
//! blog.example.org          -> Alias  { bucket: "blog" }
//! photos.sites.example.com  -> Suffix { bucket: "photos", domain: "sites.example.com" }
//! example.org               -> NoMatch
//! ```

use std::sync::Arc;

use crate::policy::{PolicyTable, ServingPolicy};

/// Outcome of hostname resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainMatch {
    /// The host is a registered alias.
    Alias {
        /// The normalized host that matched.
        host: String,
        /// Patched policy of the aliased bucket.
        policy: ServingPolicy,
    },
    /// The host is `<bucket>.<root domain>`.
    Suffix {
        /// The root domain that matched.
        domain: String,
        /// Whether the bucket has explicit configuration.
        configured: bool,
        /// Patched (possibly synthesized) policy.
        policy: ServingPolicy,
    },
    /// No alias and no root domain applied.
    NoMatch,
}

impl DomainMatch {
    /// The resolved policy, if any.
    #[must_use]
    pub fn policy(&self) -> Option<&ServingPolicy> {
        match self {
            Self::Alias { policy, .. } | Self::Suffix { policy, .. } => Some(policy),
            Self::NoMatch => None,
        }
    }

    /// Consume the match, returning the resolved policy.
    #[must_use]
    pub fn into_policy(self) -> Option<ServingPolicy> {
        match self {
            Self::Alias { policy, .. } | Self::Suffix { policy, .. } => Some(policy),
            Self::NoMatch => None,
        }
    }

    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Alias { .. } => "alias",
            Self::Suffix { .. } => "suffix",
            Self::NoMatch => "none",
        }
    }
}

/// Maps request hostnames to serving policies.
#[derive(Debug, Clone)]
pub struct DomainResolver {
    table: Arc<PolicyTable>,
    trust_forwarded_host: bool,
}

impl DomainResolver {
    /// Create a resolver over a shared table.
    #[must_use]
    pub fn new(table: Arc<PolicyTable>, trust_forwarded_host: bool) -> Self {
        Self {
            table,
            trust_forwarded_host,
        }
    }

    /// Resolve from raw `Host` and `X-Forwarded-Host` header values.
    #[must_use]
    pub fn resolve(&self, host: Option<&str>, forwarded_host: Option<&str>) -> DomainMatch {
        match self.lookup_key(host, forwarded_host) {
            Some(key) => self.match_host(&key),
            None => DomainMatch::NoMatch,
        }
    }

    /// Pick and normalize the lookup key.
    ///
    /// A trusted, non-empty forwarded host wins over the literal host. Only
    /// the first entry of a comma-separated forwarded list is used.
    #[must_use]
    pub fn lookup_key(&self, host: Option<&str>, forwarded_host: Option<&str>) -> Option<String> {
        let forwarded = forwarded_host
            .filter(|_| self.trust_forwarded_host)
            .and_then(|value| value.split(',').next())
            .and_then(normalize_host);
        forwarded.or_else(|| host.and_then(normalize_host))
    }

    /// Resolve an already-normalized host.
    #[must_use]
    pub fn match_host(&self, host: &str) -> DomainMatch {
        if let Some(bucket) = self.table.alias_target(host) {
            return DomainMatch::Alias {
                host: host.to_owned(),
                policy: self.table.patched_policy(bucket),
            };
        }

        for domain in self.table.domains() {
            let Some(bucket) = host
                .strip_suffix(domain.as_str())
                .and_then(|rest| rest.strip_suffix('.'))
            else {
                continue;
            };
            if bucket.is_empty() {
                continue;
            }
            return DomainMatch::Suffix {
                domain: domain.clone(),
                configured: self.table.policy(bucket).is_some(),
                policy: self.table.patched_policy(bucket),
            };
        }

        DomainMatch::NoMatch
    }
}

/// Normalize a host header value for lookup.
///
/// Strips surrounding whitespace, a `:port` suffix (bracketed IPv6 literals
/// keep their brackets) and a trailing dot, then lowercases. Returns `None`
/// when nothing is left.
#[must_use]
pub fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let without_port = if raw.starts_with('[') {
        match raw.find(']') {
            Some(end) => &raw[..=end],
            None => raw,
        }
    } else {
        match raw.rsplit_once(':') {
            Some((host, port)) if port.bytes().all(|b| b.is_ascii_digit()) => host,
            _ => raw,
        }
    };
    let host = without_port.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
