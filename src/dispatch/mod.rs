//! Request orchestration.
//!
//! A request moves through
//! `Received → InputSaved → HandlerRunning → OutputFinalized → Responded`,
//! or to `Failed` from any stage before `Responded`. Everything that can be
//! checked without touching the disk (file name, extension, conversion type,
//! handler input support) is checked in `Received`, so rejected requests
//! never create a request directory. From `InputSaved` on, the request's
//! [`Scope`] owns every file and removes it on every exit path.

mod error;
mod validation;

pub use error::{ClientError, ConversionError, DispatchError};
pub use validation::{extension_of, sanitize_filename, validate_upload, ALLOWED_EXTENSIONS};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info, warn, Instrument};

use crate::config::Config;
use crate::handlers::{ConversionHandler, ConversionType, HandlerRegistry};
use crate::observability::Metrics;
use crate::output;
use crate::scope::{Artifact, FileRole, ResourceTracker, Scope};

/// One upload and the conversion the client asked for
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub file_name: String,
    pub data: Bytes,
    pub conversion_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    InputSaved,
    HandlerRunning,
    OutputFinalized,
    Responded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::InputSaved => "input_saved",
            Stage::HandlerRunning => "handler_running",
            Stage::OutputFinalized => "output_finalized",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn transition(from: Stage, to: Stage) {
    debug!(%from, %to, "Conversion stage changed");
}

/// Validated request, ready for a scope
struct Admitted {
    conversion_type: ConversionType,
    handler: Arc<dyn ConversionHandler>,
    input_name: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    tracker: ResourceTracker,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        tracker: ResourceTracker,
        timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            tracker,
            timeout,
            metrics,
        }
    }

    /// Default handlers and directories from `config`
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Self {
        Self::new(
            Arc::new(HandlerRegistry::with_defaults(config)),
            ResourceTracker::from_config(&config.server),
            config.conversion.timeout(),
            metrics,
        )
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run one conversion and hand back the promoted artifact. On any error
    /// every file the request created is already gone.
    pub async fn dispatch(&self, request: ConversionRequest) -> Result<Artifact, DispatchError> {
        let started = Instant::now();
        let result = self.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(artifact) => {
                self.metrics.conversion_succeeded();
                info!(
                    request_id = %artifact.request_id(),
                    file_name = artifact.file_name(),
                    elapsed_ms,
                    "Conversion finished"
                );
            }
            Err(DispatchError::Client(e)) => {
                self.metrics.client_rejected();
                info!(error = %e, "Conversion request rejected");
            }
            Err(e) => {
                self.metrics.conversion_failed();
                warn!(error = %e, elapsed_ms, "Conversion failed");
            }
        }

        result
    }

    async fn run(&self, request: ConversionRequest) -> Result<Artifact, DispatchError> {
        let admitted = match self.admit(&request) {
            Ok(admitted) => admitted,
            Err(e) => {
                transition(Stage::Received, Stage::Failed);
                return Err(e.into());
            }
        };

        let scope = self
            .tracker
            .begin_scope()
            .await
            .map_err(|e| DispatchError::Internal(e.to_string()))?;

        let span = tracing::info_span!(
            "conversion",
            request_id = %scope.id(),
            conversion_type = %admitted.conversion_type,
        );
        self.convert(admitted, scope, request.data)
            .instrument(span)
            .await
    }

    /// `Received`: everything that can be rejected without touching disk
    fn admit(&self, request: &ConversionRequest) -> Result<Admitted, ClientError> {
        let extension = validate_upload(&request.file_name)?;

        let conversion_type: ConversionType = request
            .conversion_type
            .parse()
            .map_err(|_| ClientError::UnknownConversionType(request.conversion_type.clone()))?;
        let handler = self
            .registry
            .resolve(conversion_type)
            .map_err(|_| ClientError::UnknownConversionType(request.conversion_type.clone()))?;

        if !handler.accepts().contains(&extension.as_str()) {
            return Err(ClientError::UnsupportedInput {
                conversion_type,
                extension,
            });
        }

        Ok(Admitted {
            conversion_type,
            handler,
            input_name: sanitize_filename(&request.file_name, &extension),
        })
    }

    async fn convert(
        &self,
        admitted: Admitted,
        mut scope: Scope,
        data: Bytes,
    ) -> Result<Artifact, DispatchError> {
        let input = scope.input_path(&admitted.input_name);
        scope.track(&input, FileRole::Input);
        if let Err(e) = tokio::fs::write(&input, &data).await {
            transition(Stage::Received, Stage::Failed);
            return Err(DispatchError::Internal(format!(
                "failed to save upload: {e}"
            )));
        }
        info!(path = %input.display(), bytes = data.len(), "Upload saved");
        transition(Stage::Received, Stage::InputSaved);

        transition(Stage::InputSaved, Stage::HandlerRunning);
        let converted = tokio::time::timeout(
            self.timeout,
            admitted.handler.convert(&input, &mut scope),
        )
        .await;

        let result = match converted {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                transition(Stage::HandlerRunning, Stage::Failed);
                return Err(ConversionError::Handler(e).into());
            }
            Err(_) => {
                transition(Stage::HandlerRunning, Stage::Failed);
                return Err(ConversionError::TimedOut(self.timeout.as_secs()).into());
            }
        };

        let finished = match output::finalize(result, &mut scope).await {
            Ok(finished) => finished,
            Err(e) => {
                transition(Stage::HandlerRunning, Stage::Failed);
                return Err(ConversionError::Output(e).into());
            }
        };
        transition(Stage::HandlerRunning, Stage::OutputFinalized);

        let artifact = scope
            .promote(&finished.path, finished.mime)
            .map_err(|e| DispatchError::Internal(e.to_string()))?;
        scope.end();
        transition(Stage::OutputFinalized, Stage::Responded);

        Ok(artifact)
    }
}
