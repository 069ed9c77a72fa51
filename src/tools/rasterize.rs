//! PDF page rasterization through poppler's `pdftoppm`.
//!
//! `pdftoppm <pdf> <dir>/<stem>` writes one file per page named
//! `<stem>-<n>.<ext>`, zero-padding `n` to the width of the page count.
//! Pages are collected back by parsing `n`, never by lexical order.

use std::path::{Path, PathBuf};

use mime::Mime;
use tracing::info;

use super::ToolError;
use super::process::ExternalCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg { quality: u8 },
    Png,
}

impl RasterFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Jpeg { .. } => "jpg",
            RasterFormat::Png => "png",
        }
    }

    pub fn mime(&self) -> Mime {
        match self {
            RasterFormat::Jpeg { .. } => mime::IMAGE_JPEG,
            RasterFormat::Png => mime::IMAGE_PNG,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rasterizer {
    program: String,
}

impl Rasterizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Render every page of `pdf` into `out_dir`, returning page files in
    /// page order.
    pub async fn rasterize(
        &self,
        pdf: &Path,
        out_dir: &Path,
        stem: &str,
        dpi: u32,
        format: RasterFormat,
    ) -> Result<Vec<PathBuf>, ToolError> {
        let mut command = ExternalCommand::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string());
        command = match format {
            RasterFormat::Jpeg { quality } => command
                .arg("-jpeg")
                .arg("-jpegopt")
                .arg(format!("quality={quality}")),
            RasterFormat::Png => command.arg("-png"),
        };
        command.arg(pdf).arg(out_dir.join(stem)).run().await?;

        let pages = collect_pages(out_dir, stem, format.extension())
            .await
            .map_err(|source| ToolError::Io {
                program: self.program.clone(),
                source,
            })?;

        if pages.is_empty() {
            return Err(ToolError::MissingOutput {
                program: self.program.clone(),
                path: out_dir.join(format!("{stem}-1.{}", format.extension())),
            });
        }

        info!(pdf = %pdf.display(), pages = pages.len(), dpi, "Rasterized PDF");
        Ok(pages)
    }
}

/// Page files `<stem>-<n>.<ext>` in `dir`, ordered by `n`.
pub async fn collect_pages(dir: &Path, stem: &str, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    let prefix = format!("{stem}-");
    let suffix = format!(".{ext}");

    let mut numbered = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let page = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&suffix))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(page) = page {
            numbered.push((page, entry.path()));
        }
    }

    numbered.sort_by_key(|(page, _)| *page);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}
