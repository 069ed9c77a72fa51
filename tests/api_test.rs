use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use async_trait::async_trait;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use convertbox::api::build_router;
use convertbox::api::models::ConversionInfo;
use convertbox::api::state::AppState;
use convertbox::config::{ByteSize, Config};
use convertbox::dispatch::Dispatcher;
use convertbox::handlers::{
    ConversionHandler, ConversionResult, ConversionType, HandlerError, HandlerRegistry, OutputUnit,
};
use convertbox::observability::Metrics;
use convertbox::scope::{FileRole, ResourceTracker, Scope};
use convertbox::tools::ToolError;

const BOUNDARY: &str = "convertbox-test-boundary";

/// Renders every page as a small JPEG-named file
struct FakeRasterizer {
    pages: usize,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ConversionHandler for FakeRasterizer {
    fn accepts(&self) -> &'static [&'static str] {
        &["pdf"]
    }

    async fn convert(
        &self,
        _input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut units = Vec::new();
        for n in 1..=self.pages {
            let path = scope.work_path(&format!("page-{n}.jpg"));
            tokio::fs::write(&path, format!("page {n}")).await?;
            scope.track(&path, FileRole::Intermediate);
            units.push(OutputUnit::from_path(path));
        }
        Ok(ConversionResult::units(units, mime::IMAGE_JPEG))
    }
}

/// Wraps the upload bytes as the "PDF"
struct FakeOffice;

#[async_trait]
impl ConversionHandler for FakeOffice {
    fn accepts(&self) -> &'static [&'static str] {
        &["doc", "docx"]
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let dest = scope.work_path("converted.pdf");
        scope.track(&dest, FileRole::Output);
        let body = tokio::fs::read(input).await?;
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend_from_slice(&body);
        tokio::fs::write(&dest, pdf).await?;
        Ok(ConversionResult::single(dest))
    }
}

/// Fails the way a crashed converter does
struct BrokenTool;

#[async_trait]
impl ConversionHandler for BrokenTool {
    fn accepts(&self) -> &'static [&'static str] {
        &["pdf"]
    }

    async fn convert(
        &self,
        _input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let partial = scope.work_path("converted.docx");
        tokio::fs::write(&partial, b"partial").await?;
        scope.track(&partial, FileRole::Intermediate);
        Err(ToolError::Failed {
            program: "pdf2docx".to_string(),
            code: Some(2),
            stderr: "invalid pdf structure".to_string(),
        }
        .into())
    }
}

struct TestApp {
    app: Router,
    rasterizer_calls: Arc<AtomicUsize>,
    upload_dir: PathBuf,
    output_dir: PathBuf,
    _temp_dir: TempDir,
}

/// Builds a test app with fake converters and isolated directories
async fn build_test_app(max_upload: ByteSize) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.server.max_upload_bytes = max_upload;
    config.server.upload_dir = temp_dir.path().join("uploads");
    config.server.output_dir = temp_dir.path().join("output");

    let rasterizer_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::new();
    registry.register(
        ConversionType::PdfToJpg,
        Arc::new(FakeRasterizer {
            pages: 3,
            calls: rasterizer_calls.clone(),
        }),
    );
    registry.register(ConversionType::WordToPdf, Arc::new(FakeOffice));
    registry.register(ConversionType::PdfToWord, Arc::new(BrokenTool));

    let tracker = ResourceTracker::from_config(&config.server);
    tracker
        .ensure_roots()
        .await
        .expect("Failed to create request roots");

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        tracker,
        Duration::from_secs(10),
        Arc::new(Metrics::new()),
    );

    TestApp {
        app: build_router(AppState::new(config.clone(), dispatcher)),
        rasterizer_calls,
        upload_dir: config.server.upload_dir,
        output_dir: config.server.output_dir,
        _temp_dir: temp_dir,
    }
}

/// Multipart body with an optional file part and optional conversion type
fn multipart_body(file: Option<(&str, &[u8])>, conversion_type: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(conversion_type) = conversion_type {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"conversion_type\"\r\n\r\n{conversion_type}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Helper to build a POST /api/convert request
fn post_convert_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri("/api/convert")
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_convert_pdf_to_zip_of_pages() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(
        Some(("scan.pdf", b"%PDF-1.4 fake")),
        Some("pdf-to-jpg"),
    ));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"converted_images.zip\""
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 3);
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        assert_eq!(entry.name(), format!("page_{}.jpg", i + 1));
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, format!("page {}", i + 1));
    }

    // Nothing is left once the body has been delivered
    assert_eq!(dir_entries(&test.upload_dir), 0);
    assert_eq!(dir_entries(&test.output_dir), 0);
}

#[tokio::test]
async fn test_convert_single_file() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(
        Some(("Annual Report.docx", b"docx bytes")),
        Some("word-to-pdf"),
    ));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"converted.pdf\""
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"%PDF-1.4\ndocx bytes");
    assert_eq!(dir_entries(&test.upload_dir), 0);
    assert_eq!(dir_entries(&test.output_dir), 0);
}

#[tokio::test]
async fn test_convert_uses_default_type_when_field_missing() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(Some(("doc.pdf", b"%PDF")), None));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test.rasterizer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_convert_disallowed_extension() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(
        Some(("setup.exe", b"MZ")),
        Some("pdf-to-jpg"),
    ));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["code"], "FILE_TYPE_NOT_ALLOWED");
    assert_eq!(error["error"], "File type not allowed");
    assert_eq!(test.rasterizer_calls.load(Ordering::SeqCst), 0);
    assert_eq!(dir_entries(&test.upload_dir), 0);
}

#[tokio::test]
async fn test_convert_unknown_conversion_type() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(
        Some(("doc.pdf", b"%PDF")),
        Some("pdf-to-gif"),
    ));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["code"], "INVALID_CONVERSION_TYPE");
    assert_eq!(error["error"], "Invalid conversion type: pdf-to-gif");
}

#[tokio::test]
async fn test_convert_missing_file_part() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(None, Some("pdf-to-jpg")));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["code"], "MISSING_FILE");
    assert_eq!(error["error"], "No file uploaded");
}

#[tokio::test]
async fn test_convert_empty_file_name() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(Some(("", b"data")), Some("pdf-to-jpg")));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["code"], "EMPTY_FILENAME");
}

#[tokio::test]
async fn test_convert_non_multipart_body_is_json_error() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = Request::builder()
        .uri("/api/convert")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"file": "report.pdf"}"#))
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let error = json_body(response).await;
    assert_eq!(error["code"], "MALFORMED_UPLOAD");
    assert!(error["error"].as_str().unwrap().starts_with("Malformed upload:"));
    assert_eq!(test.rasterizer_calls.load(Ordering::SeqCst), 0);

    let health = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(health).await.unwrap();
    let health = json_body(response).await;
    assert_eq!(health["conversions"]["client_rejections"], 1);
}

#[tokio::test]
async fn test_convert_oversized_upload_is_rejected_before_conversion() {
    let test = build_test_app(ByteSize(1024)).await;

    let payload = vec![b'x'; 4096];
    let request = post_convert_request(multipart_body(
        Some(("big.pdf", &payload)),
        Some("pdf-to-jpg"),
    ));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error = json_body(response).await;
    assert_eq!(error["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(error["error"], "File too large (limit is 1KB)");
    assert_eq!(test.rasterizer_calls.load(Ordering::SeqCst), 0);
    assert_eq!(dir_entries(&test.upload_dir), 0);
}

#[tokio::test]
async fn test_convert_oversized_upload_without_content_length() {
    let test = build_test_app(ByteSize(1024)).await;

    let payload = vec![b'x'; 4096];
    let request = Request::builder()
        .uri("/api/convert")
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            Some(("big.pdf", &payload)),
            Some("pdf-to-jpg"),
        )))
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(test.rasterizer_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_convert_handler_failure() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = post_convert_request(multipart_body(
        Some(("contract.pdf", b"%PDF")),
        Some("pdf-to-word"),
    ));
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = json_body(response).await;
    assert_eq!(error["code"], "CONVERSION_FAILED");
    let message = error["error"].as_str().unwrap();
    assert!(message.starts_with("Conversion failed: "), "{message}");
    assert!(message.contains("invalid pdf structure"), "{message}");

    assert_eq!(dir_entries(&test.upload_dir), 0);
    assert_eq!(dir_entries(&test.output_dir), 0);
}

#[tokio::test]
async fn test_list_conversions() {
    let test = build_test_app(ByteSize::mib(1)).await;

    let request = Request::builder()
        .uri("/api/conversions")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let list: Vec<ConversionInfo> = serde_json::from_slice(&body).unwrap();

    let types: Vec<_> = list.iter().map(|info| info.conversion_type).collect();
    assert_eq!(types.len(), 3);
    assert!(types.contains(&ConversionType::PdfToJpg));
    assert!(types.contains(&ConversionType::WordToPdf));
    assert!(types.contains(&ConversionType::PdfToWord));

    let word = list
        .iter()
        .find(|info| info.conversion_type == ConversionType::WordToPdf)
        .unwrap();
    assert_eq!(word.accepts, ["doc", "docx"]);
}

#[tokio::test]
async fn test_health_endpoint() {
    let test = build_test_app(ByteSize::mib(1)).await;

    // One success and one failure so the counters move
    let ok = post_convert_request(multipart_body(Some(("a.docx", b"a")), Some("word-to-pdf")));
    let response = test.app.clone().oneshot(ok).await.unwrap();
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let failed = post_convert_request(multipart_body(Some(("b.pdf", b"b")), Some("pdf-to-word")));
    test.app.clone().oneshot(failed).await.unwrap();

    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = json_body(response).await;

    assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("healthy"));
    assert!(health.get("version").is_some());

    let components = health.get("components").unwrap().as_object().unwrap();
    assert!(components.contains_key("api"));
    assert_eq!(components["upload_dir"], "healthy");
    assert_eq!(components["output_dir"], "healthy");

    assert_eq!(health["conversions"]["conversions_succeeded"], 1);
    assert_eq!(health["conversions"]["conversions_failed"], 1);
}

#[tokio::test]
async fn test_health_reports_missing_directories() {
    let test = build_test_app(ByteSize::mib(1)).await;
    std::fs::remove_dir(&test.output_dir).unwrap();

    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health = json_body(response).await;
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["components"]["output_dir"], "unavailable");
}
