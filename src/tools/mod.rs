//! External converters and the small in-crate encoders the handlers drive.
//!
//! Every collaborator here has a file-in/file(s)-out contract. The handlers
//! decide where files go (always inside the request scope); the tools only
//! read and write the paths they are given.

mod docx;
mod office;
mod ooxml;
mod pdf_image;
mod process;
mod rasterize;
mod tabula;

pub use docx::PdfToDocx;
pub use office::OfficeConverter;
pub use ooxml::{column_name, write_slide_deck, write_workbook, Sheet};
pub use pdf_image::image_to_pdf;
pub use process::{require_output, ExternalCommand, ProcessOutput};
pub use rasterize::{collect_pages, RasterFormat, Rasterizer};
pub use tabula::{parse_tables, Table, TableExtractor};

use std::path::PathBuf;
use thiserror::Error;

/// Failures of an external converter process
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", describe_exit(code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} reported success but did not produce {}", path.display())]
    MissingOutput { program: String, path: PathBuf },

    #[error("{program} produced unreadable output: {detail}")]
    InvalidOutput { program: String, detail: String },

    #[error("I/O error while collecting {program} output: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Failures of the in-process encoders (image decoding, PDF and OOXML writing)
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF encoding error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML writing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
