//! Conversion handlers for ConvertBox
//!
//! A handler turns one saved upload into a [`ConversionResult`]: either one
//! finished file or an ordered list of units that the output strategy
//! archives.
//!
//! ## Key Components
//!
//! - [`ConversionHandler`] - Trait every conversion routine implements
//! - [`HandlerRegistry`] - Maps a [`ConversionType`] to its handler
//! - [`PdfToImage`], [`PdfToWord`], [`PdfToSlides`], [`PdfToSpreadsheet`] - PDF inputs
//! - [`ImageToPdf`] - Raster image inputs
//! - [`OfficeToPdf`] - Word, PowerPoint and Excel inputs
//!
//! ## Example
//!
//! ```rust,ignore
//! use convertbox::handlers::{ConversionType, HandlerRegistry};
//!
//! let registry = HandlerRegistry::with_defaults(&config);
//! let handler = registry.resolve(ConversionType::PdfToJpg)?;
//! let result = handler.convert(&input, &mut scope).await?;
//! ```

mod image;
mod office;
mod pdf;
mod registry;
mod traits;
pub(crate) mod types;

pub use image::ImageToPdf;
pub use office::OfficeToPdf;
pub use pdf::{PdfToImage, PdfToSlides, PdfToSpreadsheet, PdfToWord};
pub use registry::{HandlerRegistry, RegistryError};
pub use traits::{ConversionHandler, HandlerError};
pub use types::{ConversionResult, ConversionType, OutputUnit, UnknownConversionType};
