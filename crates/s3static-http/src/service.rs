//! The s3static hyper service.
//!
//! [`StaticSiteService`] handles every request the same way:
//!
//! 1. Health check interception (`GET /_s3static/health`)
//! 2. Host resolution via [`DomainResolver`]
//! 3. Path resolution via [`PathResolutionEngine`]
//! 4. Response building
//! 5. Common response headers (`x-request-id`, `Server`)
//!
//! Request bodies are never read. Any method is accepted.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::header::HeaderValue;
use http::{Response, StatusCode};
use hyper::service::Service;
use percent_encoding::percent_decode_str;
use s3static_core::{
    DomainResolver, HtmlListingRenderer, ListingRenderer, ObjectStore, PathResolutionEngine,
    Resolution,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::body::SiteBody;
use crate::response::{
    internal_error_response, listing_response, not_found_response, object_response,
    simple_response, upstream_error_response,
};

/// Path answered by the health check.
pub const HEALTH_PATH: &str = "/_s3static/health";

const SERVER_NAME: &str = "s3static";

/// Multi-tenant static site service.
#[derive(Debug)]
pub struct StaticSiteService<S: ?Sized, R: ?Sized = HtmlListingRenderer> {
    resolver: Arc<DomainResolver>,
    engine: PathResolutionEngine<S, R>,
}

impl<S: ?Sized, R: ?Sized> Clone for StaticSiteService<S, R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            engine: self.engine.clone(),
        }
    }
}

impl<S, R> StaticSiteService<S, R>
where
    S: ObjectStore + ?Sized,
    R: ListingRenderer + ?Sized,
{
    /// Create a service from a resolver and an engine.
    #[must_use]
    pub fn new(resolver: Arc<DomainResolver>, engine: PathResolutionEngine<S, R>) -> Self {
        Self { resolver, engine }
    }

    /// Handle one request given its head.
    pub async fn handle(&self, parts: &http::request::Parts) -> Response<SiteBody> {
        let request_id = Uuid::new_v4().to_string();
        let response = self.process(parts, &request_id).await;
        add_common_headers(response, &request_id)
    }

    async fn process(&self, parts: &http::request::Parts, request_id: &str) -> Response<SiteBody> {
        let method = &parts.method;
        let uri = &parts.uri;
        debug!(%method, %uri, request_id, "processing request");

        if is_health_check(method, uri.path()) {
            return health_check_response();
        }

        let host = request_host(parts);
        let forwarded = header_str(parts, "x-forwarded-host");
        let matched = self.resolver.resolve(host, forwarded);
        debug!(host = ?host, match_kind = matched.kind(), request_id, "host matched");
        let Some(policy) = matched.into_policy() else {
            info!(host = ?host, forwarded = ?forwarded, request_id, "no site for host");
            return not_found_response();
        };

        let path = match percent_decode_str(uri.path()).decode_utf8() {
            Ok(path) => path,
            Err(err) => {
                info!(bucket = %policy.bucket, %uri, error = %err, request_id, "undecodable path");
                return not_found_response();
            }
        };
        match self.engine.resolve(&policy, &path).await {
            Ok(resolution) => {
                debug!(
                    bucket = %policy.bucket,
                    path = %path,
                    outcome = resolution.kind(),
                    request_id,
                    "path resolved"
                );
                match resolution {
                    Resolution::Object(object) => {
                        info!(bucket = %policy.bucket, path = %path, key = %object.key, request_id, "serving object");
                        object_response(object)
                    }
                    Resolution::Listing { prefix, html } => {
                        info!(bucket = %policy.bucket, path = %path, prefix = %prefix, request_id, "serving listing");
                        listing_response(html)
                    }
                    Resolution::NotFound => {
                        info!(bucket = %policy.bucket, path = %path, request_id, "not found");
                        not_found_response()
                    }
                    Resolution::Upstream { key, error } => {
                        warn!(
                            bucket = %policy.bucket,
                            key = %key,
                            status = %error.status,
                            request_id,
                            "responding with upstream error"
                        );
                        upstream_error_response(&error)
                    }
                }
            }
            Err(err) => {
                tracing::error!(bucket = %policy.bucket, path = %path, error = %err, request_id, "listing failed");
                internal_error_response()
            }
        }
    }
}

impl<S, R, B> Service<http::Request<B>> for StaticSiteService<S, R>
where
    S: ObjectStore + ?Sized,
    R: ListingRenderer + ?Sized,
{
    type Response = Response<SiteBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let service = self.clone();
        let (parts, _body) = req.into_parts();

        Box::pin(async move { Ok(service.handle(&parts).await) })
    }
}

/// The request host: the `Host` header, else the URI authority (HTTP/2).
fn request_host(parts: &http::request::Parts) -> Option<&str> {
    header_str(parts, http::header::HOST.as_str()).or_else(|| parts.uri.host())
}

fn header_str<'a>(parts: &'a http::request::Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Check if the request is a health check.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_PATH
}

fn health_check_response() -> Response<SiteBody> {
    simple_response(
        StatusCode::OK,
        &mime::APPLICATION_JSON,
        r#"{"status":"running","service":"s3static"}"#,
    )
}

/// Add common response headers to every response.
fn add_common_headers(mut response: Response<SiteBody>, request_id: &str) -> Response<SiteBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
