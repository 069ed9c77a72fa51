//! API utility functions
//!
//! Pure, stateless helpers for request admission and artifact responses,
//! kept out of services.rs so they can be unit tested.

use axum::extract::multipart::MultipartError;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};

use crate::dispatch::ClientError;
use crate::humanize::ByteSize;

/// Reject a request whose declared length exceeds `limit` before reading it
pub fn check_content_length(headers: &HeaderMap, limit: ByteSize) -> Result<(), ClientError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(length) if length > limit.as_u64() => Err(ClientError::PayloadTooLarge { limit }),
        _ => Ok(()),
    }
}

/// Map a multipart read failure; the body limit surfaces here for streamed
/// uploads without a Content-Length
pub fn upload_error(err: MultipartError, limit: ByteSize) -> ClientError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ClientError::PayloadTooLarge { limit }
    } else {
        ClientError::MalformedUpload(err.body_text())
    }
}

/// `attachment; filename="<name>"`, dropping characters that cannot appear
/// inside a quoted header parameter
pub fn content_disposition(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .filter(|c| (c.is_ascii_graphic() && *c != '"' && *c != '\\') || *c == ' ')
        .collect();
    let value = format!("attachment; filename=\"{safe}\"");
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
