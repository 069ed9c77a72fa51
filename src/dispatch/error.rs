use thiserror::Error;

use crate::handlers::{ConversionType, HandlerError};
use crate::humanize::ByteSize;
use crate::output::OutputError;

/// Problems with the request itself, detected before any file is written
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("No file selected")]
    EmptyFileName,

    #[error("File type not allowed")]
    DisallowedExtension { file_name: String },

    #[error("Invalid conversion type: {0}")]
    UnknownConversionType(String),

    #[error("{conversion_type} does not accept .{extension} files")]
    UnsupportedInput {
        conversion_type: ConversionType,
        extension: String,
    },

    #[error("File too large (limit is {limit})")]
    PayloadTooLarge { limit: ByteSize },

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
}

/// Failures once a handler owns the request
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("timed out after {0}s")]
    TimedOut(u64),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Internal error: {0}")]
    Internal(String),
}
