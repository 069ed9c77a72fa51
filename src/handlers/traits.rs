use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use super::types::ConversionResult;
use crate::scope::Scope;
use crate::tools::{CodecError, ToolError};

/// Handler errors. Every variant ends the request as a conversion failure.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("No tables found in PDF")]
    NoTables,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One conversion routine.
///
/// Handlers write only inside `scope` and track everything they create, so
/// whatever happens to the request afterwards, nothing outlives it.
#[async_trait]
pub trait ConversionHandler: Send + Sync {
    /// Lower-case input extensions this handler can read
    fn accepts(&self) -> &'static [&'static str];

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError>;
}
