//! Turning resolution outcomes into HTTP responses.
//!
//! | outcome          | status         | body                      |
//! |------------------|----------------|---------------------------|
//! | object           | 200            | streamed object           |
//! | listing          | 200            | rendered HTML             |
//! | not found        | 404            | `not found`               |
//! | upstream error   | store's status | store's message           |
//! | render failure   | 500            | `internal error`          |

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{self, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use mime::Mime;
use s3static_core::StoreError;
use s3static_core::store::StoredObject;
use tracing::error;

use crate::body::SiteBody;

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
#[must_use]
pub fn http_date(ts: &DateTime<Utc>) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn set_optional_header(
    builder: http::response::Builder,
    name: HeaderName,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

fn set_optional_timestamp(
    builder: http::response::Builder,
    name: HeaderName,
    value: Option<&DateTime<Utc>>,
) -> http::response::Builder {
    // A zero timestamp means the store did not report one.
    match value.filter(|ts| ts.timestamp() > 0) {
        Some(ts) => set_optional_header(builder, name, Some(&http_date(ts))),
        None => builder,
    }
}

fn content_type(mime: &Mime) -> HeaderValue {
    HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

/// A response with a fixed status, content type and buffered body.
#[must_use]
pub fn simple_response(status: StatusCode, mime: &Mime, body: impl Into<Bytes>) -> Response<SiteBody> {
    let mut response = Response::new(SiteBody::from_bytes(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type(mime));
    response
}

/// 200 with the object's metadata headers and its streamed body.
#[must_use]
pub fn object_response(object: StoredObject) -> Response<SiteBody> {
    let StoredObject { key, metadata, body } = object;

    let mut builder = Response::builder().status(StatusCode::OK);
    builder = set_optional_header(builder, header::CONTENT_TYPE, metadata.content_type.as_deref());
    builder = set_optional_header(builder, header::ETAG, metadata.etag.as_deref());
    builder = set_optional_timestamp(builder, header::LAST_MODIFIED, metadata.last_modified.as_ref());
    if let Some(len) = metadata.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    builder
        .body(SiteBody::from_stream(body))
        .unwrap_or_else(|err| {
            error!(key = %key, error = %err, "failed to build object response");
            internal_error_response()
        })
}

/// 200 with a rendered directory listing.
#[must_use]
pub fn listing_response(html: String) -> Response<SiteBody> {
    simple_response(StatusCode::OK, &mime::TEXT_HTML_UTF_8, html)
}

/// 404 for unknown hosts and exhausted candidates.
#[must_use]
pub fn not_found_response() -> Response<SiteBody> {
    simple_response(StatusCode::NOT_FOUND, &mime::TEXT_PLAIN, "not found")
}

/// The store's status and message, passed through.
#[must_use]
pub fn upstream_error_response(err: &StoreError) -> Response<SiteBody> {
    simple_response(err.status, &mime::TEXT_PLAIN, err.message.clone())
}

/// 500 without details.
#[must_use]
pub fn internal_error_response() -> Response<SiteBody> {
    simple_response(StatusCode::INTERNAL_SERVER_ERROR, &mime::TEXT_PLAIN, "internal error")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use futures::StreamExt;
    use http_body_util::BodyExt;
    use s3static_core::store::ObjectMetadata;

    use super::*;

    fn header<'a>(resp: &'a Response<SiteBody>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn stored(metadata: ObjectMetadata) -> StoredObject {
        StoredObject {
            key: "index.html".to_owned(),
            metadata,
            body: futures::stream::iter(vec![Ok(Bytes::from_static(b"<h1>hi</h1>"))]).boxed(),
        }
    }

    #[test]
    fn test_should_format_http_date() {
        let ts = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(&ts), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[tokio::test]
    async fn test_should_build_object_response() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let resp = object_response(stored(ObjectMetadata {
            content_type: Some("text/html".to_owned()),
            etag: Some("\"abc\"".to_owned()),
            last_modified: Some(ts),
            content_length: Some(11),
        }));

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("text/html"));
        assert_eq!(header(&resp, "etag"), Some("\"abc\""));
        assert_eq!(header(&resp, "last-modified"), Some("Fri, 01 Mar 2024 12:00:00 GMT"));
        assert_eq!(header(&resp, "content-length"), Some("11"));

        let body = resp.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(body.as_ref(), b"<h1>hi</h1>");
    }

    #[test]
    fn test_should_omit_missing_metadata() {
        let resp = object_response(stored(ObjectMetadata {
            last_modified: Some(DateTime::<Utc>::UNIX_EPOCH),
            ..ObjectMetadata::default()
        }));
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("etag").is_none());
        assert!(resp.headers().get("last-modified").is_none());
        assert!(resp.headers().get("content-length").is_none());
    }

    #[test]
    fn test_should_build_listing_response() {
        let resp = listing_response("<html></html>".to_owned());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_should_pass_upstream_status_and_message() {
        let err = StoreError::new("AccessDenied", StatusCode::FORBIDDEN, "Access Denied");
        let resp = upstream_error_response(&err);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(header(&resp, "content-type"), Some("text/plain"));
        let body = resp.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(body.as_ref(), b"Access Denied");
    }

    #[tokio::test]
    async fn test_should_hide_internal_error_details() {
        let resp = internal_error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(body.as_ref(), b"internal error");
    }

    #[test]
    fn test_should_build_not_found_response() {
        let resp = not_found_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(header(&resp, "content-type"), Some("text/plain"));
    }
}
