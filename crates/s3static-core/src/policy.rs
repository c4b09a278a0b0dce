//! Tenant serving policies and the process-wide policy table.
//!
//! The [`PolicyTable`] is built once from [`SiteConfig`] at startup and is
//! never mutated afterwards. It holds two maps:
//!
//! - bucket → [`ServingPolicy`]
//! - alias (hostname) → bucket
//!
//! Aliases are unique across all policies. When two policies register the
//! same alias, the one registered last wins and a warning is logged.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::warn;

use crate::config::{BucketPolicyConfig, SiteConfig};

/// How one tenant bucket is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServingPolicy {
    /// The bucket holding the site.
    pub bucket: String,
    /// Hostnames routed to this bucket.
    pub domain_aliases: BTreeSet<String>,
    /// Object served for directory-style paths.
    pub index_document: String,
    /// Object served when the requested key is missing.
    pub error_document: String,
    /// Render a listing when every candidate is missing.
    pub allow_listing: bool,
}

impl ServingPolicy {
    /// A minimal policy for `bucket`: no aliases, no documents, no listing.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            domain_aliases: BTreeSet::new(),
            index_document: String::new(),
            error_document: String::new(),
            allow_listing: false,
        }
    }

    /// Set the index document.
    #[must_use]
    pub fn with_index_document(mut self, document: impl Into<String>) -> Self {
        self.index_document = document.into();
        self
    }

    /// Set the error document.
    #[must_use]
    pub fn with_error_document(mut self, document: impl Into<String>) -> Self {
        self.error_document = document.into();
        self
    }

    /// Allow or forbid directory listings.
    #[must_use]
    pub fn with_listing(mut self, allow: bool) -> Self {
        self.allow_listing = allow;
        self
    }

    /// Fill empty document fields from `defaults`.
    #[must_use]
    pub fn patched(mut self, defaults: &DocumentDefaults) -> Self {
        if self.index_document.is_empty() {
            self.index_document.clone_from(&defaults.index_document);
        }
        if self.error_document.is_empty() {
            self.error_document.clone_from(&defaults.error_document);
        }
        self
    }
}

/// Process-wide default documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentDefaults {
    /// Default index document.
    pub index_document: String,
    /// Default error document.
    pub error_document: String,
}

/// Immutable table of serving policies and hostname aliases.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<String, ServingPolicy>,
    aliases: HashMap<String, String>,
    domains: Vec<String>,
    defaults: DocumentDefaults,
}

impl PolicyTable {
    /// An empty table with the given root domains and default documents.
    ///
    /// Domains are lowercased and stripped of leading/trailing dots; empty
    /// entries are dropped. Order is preserved.
    #[must_use]
    pub fn new(domains: impl IntoIterator<Item = String>, defaults: DocumentDefaults) -> Self {
        let domains = domains
            .into_iter()
            .map(|d| d.trim().trim_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            policies: HashMap::new(),
            aliases: HashMap::new(),
            domains,
            defaults,
        }
    }

    /// Build the table from configuration.
    #[must_use]
    pub fn from_config(config: &SiteConfig) -> Self {
        let defaults = DocumentDefaults {
            index_document: config.default_index_document.clone(),
            error_document: config.default_error_document.clone(),
        };
        let mut table = Self::new(config.domains.iter().cloned(), defaults);
        for policy in &config.policies {
            table.register(policy);
        }
        table
    }

    /// Register one configured policy and all of its aliases.
    ///
    /// Bucket aliases expand to `<alias>.<root>` for every root domain.
    pub fn register(&mut self, config: &BucketPolicyConfig) {
        let mut aliases: BTreeSet<String> = config
            .domain_alias
            .iter()
            .map(|a| normalize_alias(a))
            .filter(|a| !a.is_empty())
            .collect();
        for bucket_alias in &config.bucket_alias {
            let bucket_alias = normalize_alias(bucket_alias);
            if bucket_alias.is_empty() {
                continue;
            }
            for root in &self.domains {
                aliases.insert(format!("{bucket_alias}.{root}"));
            }
        }

        for alias in &aliases {
            if let Some(previous) = self.aliases.insert(alias.clone(), config.bucket.clone()) {
                if previous != config.bucket {
                    warn!(
                        alias = %alias,
                        previous_bucket = %previous,
                        bucket = %config.bucket,
                        "alias registered twice, last registration wins"
                    );
                }
            }
        }

        let policy = ServingPolicy {
            bucket: config.bucket.clone(),
            domain_aliases: aliases,
            index_document: config.index_document.clone(),
            error_document: config.error_document.clone(),
            allow_listing: config.allow_listing,
        };
        if self.policies.insert(config.bucket.clone(), policy).is_some() {
            warn!(bucket = %config.bucket, "bucket configured twice, last policy wins");
        }
    }

    /// The configured (unpatched) policy for `bucket`.
    #[must_use]
    pub fn policy(&self, bucket: &str) -> Option<&ServingPolicy> {
        self.policies.get(bucket)
    }

    /// The bucket an alias points to.
    #[must_use]
    pub fn alias_target(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Root domains in match order.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Process-wide default documents.
    #[must_use]
    pub fn defaults(&self) -> &DocumentDefaults {
        &self.defaults
    }

    /// Patched policy for `bucket`; a minimal one is synthesized when the
    /// bucket has no explicit configuration.
    #[must_use]
    pub fn patched_policy(&self, bucket: &str) -> ServingPolicy {
        self.policies
            .get(bucket)
            .cloned()
            .unwrap_or_else(|| ServingPolicy::new(bucket))
            .patched(&self.defaults)
    }

    /// Number of configured policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no policy is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// The alias → bucket table as pretty-printed JSON, keys sorted.
    pub fn dump_aliases(&self) -> serde_json::Result<String> {
        let sorted: BTreeMap<&str, &str> = self
            .aliases
            .iter()
            .map(|(alias, bucket)| (alias.as_str(), bucket.as_str()))
            .collect();
        serde_json::to_string_pretty(&sorted)
    }
}

fn normalize_alias(alias: &str) -> String {
    alias.trim().trim_end_matches('.').to_ascii_lowercase()
}
