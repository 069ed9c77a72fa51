use std::path::Path;

use async_trait::async_trait;

use super::traits::{ConversionHandler, HandlerError};
use super::types::ConversionResult;
use crate::scope::{FileRole, Scope};
use crate::tools::image_to_pdf;

/// A raster image as a one-page PDF
pub struct ImageToPdf {
    accepts: &'static [&'static str],
    dpi: u32,
    quality: u8,
}

impl ImageToPdf {
    pub const ANY_IMAGE: &'static [&'static str] = &["jpg", "jpeg", "png"];
    pub const PNG_ONLY: &'static [&'static str] = &["png"];

    pub fn new(accepts: &'static [&'static str], dpi: u32, quality: u8) -> Self {
        Self {
            accepts,
            dpi,
            quality,
        }
    }
}

#[async_trait]
impl ConversionHandler for ImageToPdf {
    fn accepts(&self) -> &'static [&'static str] {
        self.accepts
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        let dest = scope.work_path("converted.pdf");
        scope.track(&dest, FileRole::Output);

        let (src, out) = (input.to_path_buf(), dest.clone());
        let (dpi, quality) = (self.dpi, self.quality);
        tokio::task::spawn_blocking(move || image_to_pdf(&src, &out, dpi, quality)).await??;

        Ok(ConversionResult::single(dest))
    }
}
