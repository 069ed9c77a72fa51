//! Handlers that read a PDF.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::traits::{ConversionHandler, HandlerError};
use super::types::{ConversionResult, OutputUnit};
use crate::scope::{FileRole, Scope};
use crate::tools::{
    write_slide_deck, write_workbook, PdfToDocx, RasterFormat, Rasterizer, Sheet, TableExtractor,
};

const PDF: &[&str] = &["pdf"];

/// Render pages with `format` and take ownership of every page file.
async fn rasterize_tracked(
    rasterizer: &Rasterizer,
    input: &Path,
    scope: &mut Scope,
    stem: &str,
    dpi: u32,
    format: RasterFormat,
) -> Result<Vec<PathBuf>, HandlerError> {
    let pages = rasterizer
        .rasterize(input, scope.work_dir(), stem, dpi, format)
        .await?;
    for page in &pages {
        scope.track(page, FileRole::Intermediate);
    }
    Ok(pages)
}

/// Every page as a JPEG unit
pub struct PdfToImage {
    rasterizer: Rasterizer,
    dpi: u32,
    quality: u8,
}

impl PdfToImage {
    pub fn new(rasterizer: Rasterizer, dpi: u32, quality: u8) -> Self {
        Self {
            rasterizer,
            dpi,
            quality,
        }
    }
}

#[async_trait]
impl ConversionHandler for PdfToImage {
    fn accepts(&self) -> &'static [&'static str] {
        PDF
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let format = RasterFormat::Jpeg {
            quality: self.quality,
        };
        let pages =
            rasterize_tracked(&self.rasterizer, input, scope, "page", self.dpi, format).await?;

        let units = pages.into_iter().map(OutputUnit::from_path).collect();
        Ok(ConversionResult::units(units, format.mime()))
    }
}

pub struct PdfToWord {
    converter: PdfToDocx,
}

impl PdfToWord {
    pub fn new(converter: PdfToDocx) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConversionHandler for PdfToWord {
    fn accepts(&self) -> &'static [&'static str] {
        PDF
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let dest = scope.work_path("converted.docx");
        scope.track(&dest, FileRole::Output);

        self.converter.convert(input, &dest).await?;
        Ok(ConversionResult::single(dest))
    }
}

/// One slide per page, each page a full-bleed PNG
pub struct PdfToSlides {
    rasterizer: Rasterizer,
    dpi: u32,
}

impl PdfToSlides {
    pub fn new(rasterizer: Rasterizer, dpi: u32) -> Self {
        Self { rasterizer, dpi }
    }
}

#[async_trait]
impl ConversionHandler for PdfToSlides {
    fn accepts(&self) -> &'static [&'static str] {
        PDF
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let pages = rasterize_tracked(
            &self.rasterizer,
            input,
            scope,
            "slide",
            self.dpi,
            RasterFormat::Png,
        )
        .await?;

        let dest = scope.work_path("converted.pptx");
        scope.track(&dest, FileRole::Output);

        let deck = dest.clone();
        let slides = pages.len();
        tokio::task::spawn_blocking(move || write_slide_deck(&pages, &deck)).await??;

        info!(slides, "Slide deck written");
        Ok(ConversionResult::single(dest))
    }
}

/// Every detected table as its own `Table_<n>` sheet
pub struct PdfToSpreadsheet {
    extractor: TableExtractor,
}

impl PdfToSpreadsheet {
    pub fn new(extractor: TableExtractor) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl ConversionHandler for PdfToSpreadsheet {
    fn accepts(&self) -> &'static [&'static str] {
        PDF
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let tables = self.extractor.extract(input).await?;
        if tables.is_empty() {
            return Err(HandlerError::NoTables);
        }

        let sheets: Vec<Sheet> = tables
            .into_iter()
            .enumerate()
            .map(|(i, rows)| Sheet {
                name: format!("Table_{}", i + 1),
                rows,
            })
            .collect();

        let dest = scope.work_path("converted.xlsx");
        scope.track(&dest, FileRole::Output);

        let workbook = dest.clone();
        let count = sheets.len();
        tokio::task::spawn_blocking(move || write_workbook(&sheets, &workbook)).await??;

        info!(tables = count, "Workbook written");
        Ok(ConversionResult::single(dest))
    }
}
