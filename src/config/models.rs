use crate::handlers::ConversionType;
use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Largest accepted request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: ByteSize,
    /// Root for per-request upload directories
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Root for per-request output directories
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_max_upload_bytes() -> ByteSize {
    ByteSize::mib(100)
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Conversion behaviour shared by all requests
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Used when a request names no conversion type
    #[serde(default = "default_conversion_type")]
    pub default_type: ConversionType,
    /// Upper bound on one handler run, external tools included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// PDF to JPEG rendering resolution
    #[serde(default = "default_jpg_dpi")]
    pub jpg_dpi: u32,
    /// JPEG quality for rendered pages and image-to-PDF re-encoding
    #[serde(default = "default_jpg_quality")]
    pub jpg_quality: u8,
    /// PDF to slide deck rendering resolution
    #[serde(default = "default_slide_dpi")]
    pub slide_dpi: u32,
    /// Page geometry resolution for image to PDF
    #[serde(default = "default_image_pdf_dpi")]
    pub image_pdf_dpi: u32,
}

impl ConversionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_type: default_conversion_type(),
            timeout_secs: default_timeout_secs(),
            jpg_dpi: default_jpg_dpi(),
            jpg_quality: default_jpg_quality(),
            slide_dpi: default_slide_dpi(),
            image_pdf_dpi: default_image_pdf_dpi(),
        }
    }
}

fn default_conversion_type() -> ConversionType {
    ConversionType::PdfToJpg
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_jpg_dpi() -> u32 {
    200
}

fn default_jpg_quality() -> u8 {
    95
}

fn default_slide_dpi() -> u32 {
    150
}

fn default_image_pdf_dpi() -> u32 {
    100
}

/// External converter programs, looked up on `PATH` unless absolute
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: String,
    #[serde(default = "default_pdf2docx")]
    pub pdf2docx: String,
    #[serde(default = "default_java")]
    pub java: String,
    #[serde(default = "default_tabula_jar")]
    pub tabula_jar: PathBuf,
    #[serde(default = "default_libreoffice")]
    pub libreoffice: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdftoppm: default_pdftoppm(),
            pdf2docx: default_pdf2docx(),
            java: default_java(),
            tabula_jar: default_tabula_jar(),
            libreoffice: default_libreoffice(),
        }
    }
}

fn default_pdftoppm() -> String {
    "pdftoppm".to_string()
}

fn default_pdf2docx() -> String {
    "pdf2docx".to_string()
}

fn default_java() -> String {
    "java".to_string()
}

fn default_tabula_jar() -> PathBuf {
    PathBuf::from("tabula.jar")
}

fn default_libreoffice() -> String {
    "libreoffice".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:5000");
        assert_eq!(config.server.max_upload_bytes.as_u64(), 100 * 1024 * 1024);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.conversion.default_type, ConversionType::PdfToJpg);
        assert_eq!(config.conversion.timeout(), Duration::from_secs(300));
        assert_eq!(config.conversion.jpg_dpi, 200);
        assert_eq!(config.conversion.slide_dpi, 150);
        assert_eq!(config.tools.libreoffice, "libreoffice");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[server]
max_upload_bytes = "20MB"

[conversion]
default_type = "word-to-pdf"
jpg_quality = 80
            "#,
        )
        .unwrap();

        assert_eq!(config.server.max_upload_bytes, ByteSize::mib(20));
        assert_eq!(config.server.output_dir, PathBuf::from("output"));
        assert_eq!(config.conversion.default_type, ConversionType::WordToPdf);
        assert_eq!(config.conversion.jpg_quality, 80);
        assert_eq!(config.conversion.jpg_dpi, 200);
        assert_eq!(config.tools.java, "java");
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let rendered = toml::to_string(&Config::default()).unwrap();
        assert!(rendered.contains("default_type = \"pdf-to-jpg\""));
        assert!(rendered.contains("tabula_jar = \"tabula.jar\""));
    }
}
