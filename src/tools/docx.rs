use std::path::Path;

use super::ToolError;
use super::process::{require_output, ExternalCommand};

/// PDF to editable Word document via the `pdf2docx` command line.
#[derive(Debug, Clone)]
pub struct PdfToDocx {
    program: String,
}

impl PdfToDocx {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Convert all pages, starting at the first, into `docx`.
    pub async fn convert(&self, pdf: &Path, docx: &Path) -> Result<(), ToolError> {
        ExternalCommand::new(&self.program)
            .arg("convert")
            .arg(pdf)
            .arg(docx)
            .arg("--start=0")
            .run()
            .await?;

        require_output(&self.program, docx).await
    }
}
