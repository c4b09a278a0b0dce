//! [`ObjectStore`] over `aws-sdk-s3`.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use s3static_core::error::StoreResult;
use s3static_core::store::{KeyStream, ObjectBody, ObjectMetadata, ObjectStore, StoredObject};
use tracing::{debug, trace};

use crate::config::S3StoreConfig;
use crate::error::{fetch_error, store_error};

/// Object store backed by an S3-compatible service.
///
/// The client (and its connection pool) is shared by every request.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from connection settings.
    ///
    /// Static credentials are used when configured, otherwise the default
    /// AWS provider chain.
    pub async fn connect(config: &S3StoreConfig) -> Self {
        let endpoint = config.endpoint_url();
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&endpoint);
        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "s3static-config",
            ));
        }
        let shared_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(config.force_path_style)
            .build();
        debug!(
            endpoint = %endpoint,
            region = %config.region,
            force_path_style = config.force_path_style,
            "s3 client configured"
        );
        Self::from_client(Client::from_conf(s3_config))
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
        trace!(bucket, key, "get object");
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| fetch_error(key, &err))?;

        let metadata = ObjectMetadata {
            content_type: output.content_type().map(str::to_owned),
            etag: output.e_tag().map(str::to_owned),
            last_modified: output.last_modified().and_then(to_chrono),
            content_length: output.content_length().and_then(|len| u64::try_from(len).ok()),
        };

        Ok(StoredObject {
            key: key.to_owned(),
            metadata,
            body: object_body(output.body),
        })
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> KeyStream {
        trace!(bucket, prefix, "list objects");
        let pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter("/")
            .into_paginator()
            .send();

        futures::stream::unfold(Some(pages), |pages| async move {
            let mut pages = pages?;
            match pages.next().await? {
                Ok(page) => {
                    let keys: Vec<StoreResult<String>> = page
                        .common_prefixes()
                        .iter()
                        .filter_map(|p| p.prefix())
                        .chain(page.contents().iter().filter_map(|o| o.key()))
                        .map(|key| Ok(key.to_owned()))
                        .collect();
                    Some((futures::stream::iter(keys), Some(pages)))
                }
                // The listing ends after its first error.
                Err(err) => Some((futures::stream::iter(vec![Err(store_error(&err))]), None)),
            }
        })
        .flatten()
        .boxed()
    }
}

/// Adapt the SDK byte stream to the store body type.
fn object_body(stream: ByteStream) -> ObjectBody {
    futures::stream::unfold(stream, |mut stream| async move {
        match stream.next().await? {
            Ok(chunk) => Some((Ok(chunk), stream)),
            Err(err) => Some((Err(std::io::Error::other(err)), stream)),
        }
    })
    .boxed()
}

fn to_chrono(ts: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
