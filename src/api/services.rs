use std::collections::BTreeMap;

use axum::{
    Json,
    body::Body,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;

use super::{
    error::ApiError,
    models::{ConversionInfo, HealthResponse},
    state::AppState,
    utils::{check_content_length, content_disposition, upload_error},
};
use crate::dispatch::{ClientError, ConversionRequest};
use crate::scope::Artifact;

/// Read size for streaming artifacts back to the client
const CHUNK_SIZE: usize = 64 * 1024;

/// Conversion endpoint (POST /api/convert)
///
/// Multipart form with a `file` part and an optional `conversion_type` text
/// part (defaults to `conversion.default_type`). Responds with the converted
/// file as an attachment, or a JSON error.
///
/// ## Flow:
/// 1. Reject a declared body larger than `server.max_upload_bytes`, and a
///    body that is not `multipart/form-data`
/// 2. Read the multipart form (the body limit also stops chunked uploads)
/// 3. Dispatch: validate, convert inside a request scope, promote the result
/// 4. Stream the artifact; it is deleted once the body is done or dropped
pub async fn convert(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let request = match read_upload(&state, &headers, multipart).await {
        Ok(request) => request,
        Err(e) => {
            state.metrics.client_rejected();
            tracing::info!(error = %e, "Upload rejected");
            return Err(e.into());
        }
    };

    let artifact = state.dispatcher.dispatch(request).await?;
    artifact_response(artifact).await
}

async fn read_upload(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ConversionRequest, ClientError> {
    let limit = state.config.server.max_upload_bytes;
    check_content_length(headers, limit)?;
    let mut multipart =
        multipart.map_err(|rejection| ClientError::MalformedUpload(rejection.body_text()))?;

    let mut upload: Option<(String, Bytes)> = None;
    let mut conversion_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| upload_error(e, limit))?;
                upload = Some((file_name, data));
            }
            Some("conversion_type") => {
                conversion_type = Some(field.text().await.map_err(|e| upload_error(e, limit))?);
            }
            _ => {}
        }
    }

    let (file_name, data) = upload.ok_or(ClientError::MissingFile)?;
    let conversion_type =
        conversion_type.unwrap_or_else(|| state.config.conversion.default_type.to_string());

    Ok(ConversionRequest {
        file_name,
        data,
        conversion_type,
    })
}

/// Stream `artifact` as an attachment. The artifact rides along with the
/// body stream, so its file is deleted after the last chunk is read or when
/// the client goes away.
async fn artifact_response(artifact: Artifact) -> Result<Response, ApiError> {
    let length = artifact.size().await?;
    let file = tokio::fs::File::open(artifact.path()).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        artifact
            .mime()
            .as_ref()
            .parse::<HeaderValue>()
            .map_err(|_| ApiError::Internal("unrepresentable content type".to_string()))?,
    );
    headers.insert(header::CONTENT_LENGTH, length.into());
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(artifact.file_name()),
    );

    let stream = futures::stream::unfold(Some((file, artifact)), |delivery| async move {
        let (mut file, artifact) = delivery?;
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        match file.read_buf(&mut buf).await {
            Ok(0) => {
                tracing::debug!(request_id = %artifact.request_id(), "Artifact delivered");
                None
            }
            Ok(_) => Some((Ok(buf.freeze()), Some((file, artifact)))),
            Err(e) => Some((Err(e), None)),
        }
    });

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// Supported conversions (GET /api/conversions)
pub async fn conversions(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.dispatcher.registry();
    let list: Vec<ConversionInfo> = registry
        .conversion_types()
        .into_iter()
        .filter_map(|conversion_type| {
            let handler = registry.resolve(conversion_type).ok()?;
            Some(ConversionInfo {
                conversion_type,
                accepts: handler.accepts().iter().map(|e| e.to_string()).collect(),
            })
        })
        .collect();

    Json(list)
}

/// Health check endpoint (GET /health)
///
/// Reports the API itself and whether the upload and output roots are
/// usable, plus conversion counters. Returns 503 Service Unavailable if any
/// component is unhealthy, 200 OK otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = state.dispatcher.tracker();

    let mut components = BTreeMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    for (name, dir) in [
        ("upload_dir", tracker.upload_root()),
        ("output_dir", tracker.output_root()),
    ] {
        let healthy = tokio::fs::metadata(dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        let status = if healthy { "healthy" } else { "unavailable" };
        components.insert(name.to_string(), status.to_string());
    }

    let all_healthy = components.values().all(|status| status == "healthy");
    let (status_code, overall_status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        conversions: state.metrics.snapshot(),
    };

    (status_code, Json(response))
}
