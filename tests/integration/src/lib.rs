//! Integration tests for the s3static server.
//!
//! These tests require a running s3static server and the S3-compatible
//! store it reads from. They are marked `#[ignore]` so they don't run during
//! normal `cargo test`.
//!
//! The server is expected to run with a configuration equivalent to:
//!
//! ```toml
//! listen = "0.0.0.0:8080"
//! endpoint = "http://localhost:9000"
//! access_key = "test"
//! secret_key = "test"
//! domains = ["sites.localhost"]
//! default_error_document = "404.html"
//!
//! [[policies]]
//! bucket = "s3static-listing"
//! domain_alias = ["files.localhost"]
//! allow_listing = true
//! ```
//!
//! Run them with:
//! ```text
//! cargo test -p s3static-integration -- --ignored
//! ```

use std::sync::Once;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;

static INIT: Once = Once::new();

/// Bucket configured with `allow_listing = true` on the server.
pub const LISTING_BUCKET: &str = "s3static-listing";

/// Alias of [`LISTING_BUCKET`].
pub const LISTING_HOST: &str = "files.localhost";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Base URL of the s3static server.
#[must_use]
pub fn server_url() -> String {
    env_or("S3STATIC_URL", "http://localhost:8080")
}

/// Root domain the server strips to find bucket names.
#[must_use]
pub fn root_domain() -> String {
    env_or("S3STATIC_ROOT_DOMAIN", "sites.localhost")
}

/// Host header that routes to `bucket` by suffix.
#[must_use]
pub fn site_host(bucket: &str) -> String {
    format!("{bucket}.{}", root_domain())
}

/// Client for the backing store, used to seed site content.
#[must_use]
pub fn backend_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new(
        env_or("S3STATIC_ACCESS_KEY", "test"),
        env_or("S3STATIC_SECRET_KEY", "test"),
        None,
        None,
        "integration-test",
    );

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(env_or("S3STATIC_BACKEND_URL", "http://localhost:9000"))
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// GET `path` from the server with the given `Host` header.
pub async fn site_get(host: &str, path: &str) -> reqwest::Response {
    site_request(host, path, &[]).await
}

/// GET `path` with a `Host` header and extra headers.
pub async fn site_request(host: &str, path: &str, headers: &[(&str, &str)]) -> reqwest::Response {
    let mut req = reqwest::Client::new()
        .get(format!("{}{path}", server_url()))
        .header(reqwest::header::HOST, host);
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    req.send()
        .await
        .unwrap_or_else(|e| panic!("request to {host}{path} failed: {e}"))
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("site-{prefix}-{id}")
}

/// Create a bucket and return its name. Caller is responsible for cleanup.
pub async fn create_test_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Create the shared listing bucket if it does not exist yet.
pub async fn ensure_listing_bucket(client: &aws_sdk_s3::Client) {
    if client.head_bucket().bucket(LISTING_BUCKET).send().await.is_err() {
        let _ = client.create_bucket().bucket(LISTING_BUCKET).send().await;
    }
}

/// Upload one object.
pub async fn put(client: &aws_sdk_s3::Client, bucket: &str, key: &str, body: &str, content_type: &str) {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body.as_bytes().to_vec()))
        .content_type(content_type)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to put {bucket}/{key}: {e}"));
}

/// Delete every object under `prefix`.
pub async fn cleanup_prefix(client: &aws_sdk_s3::Client, bucket: &str, prefix: &str) {
    let mut continuation_token = None;
    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(token) = continuation_token.take() {
            req = req.continuation_token(token);
        }
        let Ok(resp) = req.send().await else {
            return; // Bucket may not exist.
        };

        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                let _ = client.delete_object().bucket(bucket).key(key).send().await;
            }
        }

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(ToOwned::to_owned);
        } else {
            break;
        }
    }
}

/// Delete all objects in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    cleanup_prefix(client, bucket, "").await;
    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_health;
mod test_listing;
mod test_serving;
