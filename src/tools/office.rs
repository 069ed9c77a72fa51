use std::path::{Path, PathBuf};

use tracing::debug;

use super::ToolError;
use super::process::{require_output, ExternalCommand};

/// Office document to PDF through a headless LibreOffice run.
///
/// LibreOffice refuses to run two conversions against one user profile, so
/// every call gets its own profile directory from the caller.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: String,
}

impl OfficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Render `input` into `out_dir`, returning the path of the written PDF
    /// (`<out_dir>/<input stem>.pdf`).
    pub async fn to_pdf(
        &self,
        input: &Path,
        out_dir: &Path,
        profile_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        let output = Self::output_path(input, out_dir);
        debug!(input = %input.display(), output = %output.display(), "Starting office conversion");

        ExternalCommand::new(&self.program)
            .arg(format!("-env:UserInstallation={}", file_url(profile_dir)))
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .run()
            .await?;

        require_output(&self.program, &output).await?;
        Ok(output)
    }

    /// Where LibreOffice writes the PDF for `input`
    pub fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        out_dir.join(format!("{stem}.pdf"))
    }
}

/// `file://` URL for an absolute directory, each path segment
/// percent-encoded.
fn file_url(dir: &Path) -> String {
    let raw = dir.to_string_lossy();
    let path = raw
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("file://{path}")
}
