use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::dispatch::{ClientError, ConversionError, DispatchError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Client(ClientError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Client(_) => StatusCode::BAD_REQUEST,
            ApiError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Client(err) => match err {
                ClientError::MissingFile => "MISSING_FILE",
                ClientError::EmptyFileName => "EMPTY_FILENAME",
                ClientError::DisallowedExtension { .. } => "FILE_TYPE_NOT_ALLOWED",
                ClientError::UnknownConversionType(_) => "INVALID_CONVERSION_TYPE",
                ClientError::UnsupportedInput { .. } => "UNSUPPORTED_INPUT",
                ClientError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
                ClientError::MalformedUpload(_) => "MALFORMED_UPLOAD",
            },
            ApiError::Conversion(ConversionError::TimedOut(_)) => "CONVERSION_TIMEOUT",
            ApiError::Conversion(_) => "CONVERSION_FAILED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Client(e) => ApiError::Client(e),
            DispatchError::Conversion(e) => ApiError::Conversion(e),
            DispatchError::Internal(message) => ApiError::Internal(message),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(value: std::io::Error) -> Self {
        ApiError::Internal(value.to_string())
    }
}
