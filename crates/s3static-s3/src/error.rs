//! Mapping SDK errors onto [`StoreError`].
//!
//! Missing keys become `NoSuchKey` so the try-files chain moves on. Service
//! errors keep the code, message and HTTP status S3 returned. Errors without
//! a response (dispatch, timeout, construction) become `UpstreamUnavailable`
//! with a fixed message; the SDK's details are only logged.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use http::StatusCode;
use s3static_core::StoreError;
use s3static_core::error::NO_SUCH_KEY;
use tracing::warn;

/// Client-facing message when the store returned no response.
pub const UNAVAILABLE_MESSAGE: &str = "upstream unavailable";

/// Map a `GetObject` failure for `key`.
pub fn fetch_error(key: &str, err: &SdkError<GetObjectError, HttpResponse>) -> StoreError {
    if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
        return StoreError::no_such_key(key);
    }
    store_error(err)
}

/// Map any SDK failure.
pub fn store_error<E>(err: &SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let Some(response) = err.raw_response() else {
        warn!(error = %DisplayErrorContext(err), "object store unreachable");
        return StoreError::unavailable(UNAVAILABLE_MESSAGE);
    };
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    match err.code() {
        Some(code) => StoreError::new(code, status, err.message().unwrap_or(code)),
        // HEAD-style 404s carry no error body.
        None if status == StatusCode::NOT_FOUND => {
            StoreError::new(NO_SUCH_KEY, status, "The specified key does not exist.")
        }
        None => {
            warn!(%status, error = %DisplayErrorContext(err), "object store error without code");
            let reason = status.canonical_reason().unwrap_or("Unknown Error");
            StoreError::new(reason.replace(' ', ""), status, reason)
        }
    }
}
