use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::image::ImageToPdf;
use super::office::OfficeToPdf;
use super::pdf::{PdfToImage, PdfToSlides, PdfToSpreadsheet, PdfToWord};
use super::traits::ConversionHandler;
use super::types::ConversionType;
use crate::config::Config;
use crate::tools::{OfficeConverter, PdfToDocx, Rasterizer, TableExtractor};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler not found: {0}")]
    NotFound(ConversionType),
}

/// Conversion type to handler, built once at startup and shared read-only
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<ConversionType, Arc<dyn ConversionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conversion_type: ConversionType, handler: Arc<dyn ConversionHandler>) {
        self.handlers.insert(conversion_type, handler);
    }

    pub fn resolve(
        &self,
        conversion_type: ConversionType,
    ) -> Result<Arc<dyn ConversionHandler>, RegistryError> {
        self.handlers
            .get(&conversion_type)
            .cloned()
            .ok_or(RegistryError::NotFound(conversion_type))
    }

    /// Registered types in wire order
    pub fn conversion_types(&self) -> Vec<ConversionType> {
        self.handlers.keys().copied().collect()
    }

    /// The built-in handlers, wired to the configured tools
    pub fn with_defaults(config: &Config) -> Self {
        let conversion = &config.conversion;
        let tools = &config.tools;
        let rasterizer = Rasterizer::new(&tools.pdftoppm);
        let office = OfficeConverter::new(&tools.libreoffice);

        let mut registry = Self::new();
        registry.register(
            ConversionType::PdfToJpg,
            Arc::new(PdfToImage::new(
                rasterizer.clone(),
                conversion.jpg_dpi,
                conversion.jpg_quality,
            )),
        );
        registry.register(
            ConversionType::PdfToWord,
            Arc::new(PdfToWord::new(PdfToDocx::new(&tools.pdf2docx))),
        );
        registry.register(
            ConversionType::PdfToPpt,
            Arc::new(PdfToSlides::new(rasterizer, conversion.slide_dpi)),
        );
        registry.register(
            ConversionType::PdfToExcel,
            Arc::new(PdfToSpreadsheet::new(TableExtractor::new(
                &tools.java,
                &tools.tabula_jar,
            ))),
        );
        registry.register(
            ConversionType::JpgToPdf,
            Arc::new(ImageToPdf::new(
                ImageToPdf::ANY_IMAGE,
                conversion.image_pdf_dpi,
                conversion.jpg_quality,
            )),
        );
        registry.register(
            ConversionType::PngToPdf,
            Arc::new(ImageToPdf::new(
                ImageToPdf::PNG_ONLY,
                conversion.image_pdf_dpi,
                conversion.jpg_quality,
            )),
        );
        registry.register(
            ConversionType::WordToPdf,
            Arc::new(OfficeToPdf::new(office.clone(), OfficeToPdf::WORD)),
        );
        registry.register(
            ConversionType::PowerpointToPdf,
            Arc::new(OfficeToPdf::new(office.clone(), OfficeToPdf::POWERPOINT)),
        );
        registry.register(
            ConversionType::ExcelToPdf,
            Arc::new(OfficeToPdf::new(office, OfficeToPdf::EXCEL)),
        );

        registry
    }
}
