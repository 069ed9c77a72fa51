use std::path::Path;

use async_trait::async_trait;

use super::traits::{ConversionHandler, HandlerError};
use super::types::ConversionResult;
use crate::scope::{FileRole, Scope};
use crate::tools::OfficeConverter;

/// Word, PowerPoint or Excel document rendered to PDF by LibreOffice
pub struct OfficeToPdf {
    converter: OfficeConverter,
    accepts: &'static [&'static str],
}

impl OfficeToPdf {
    pub const WORD: &'static [&'static str] = &["doc", "docx"];
    pub const POWERPOINT: &'static [&'static str] = &["ppt", "pptx"];
    pub const EXCEL: &'static [&'static str] = &["xls", "xlsx"];

    pub fn new(converter: OfficeConverter, accepts: &'static [&'static str]) -> Self {
        Self { converter, accepts }
    }
}

#[async_trait]
impl ConversionHandler for OfficeToPdf {
    fn accepts(&self) -> &'static [&'static str] {
        self.accepts
    }

    async fn convert(
        &self,
        input: &Path,
        scope: &mut Scope,
    ) -> Result<ConversionResult, HandlerError> {
        // The profile lives in the upload directory and goes with it
        let profile = scope.input_path("lo-profile");
        let rendered = OfficeConverter::output_path(input, scope.work_dir());
        scope.track(&rendered, FileRole::Intermediate);

        self.converter
            .to_pdf(input, scope.work_dir(), &profile)
            .await?;

        let dest = scope.work_path("converted.pdf");
        if rendered != dest {
            tokio::fs::rename(&rendered, &dest).await?;
            scope.forget(&rendered);
        }
        scope.track(&dest, FileRole::Output);

        Ok(ConversionResult::single(dest))
    }
}
