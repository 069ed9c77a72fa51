use mime::Mime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Client-selected conversion, identified on the wire by its kebab-case name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConversionType {
    #[serde(rename = "pdf-to-jpg")]
    PdfToJpg,
    #[serde(rename = "pdf-to-word")]
    PdfToWord,
    #[serde(rename = "pdf-to-ppt")]
    PdfToPpt,
    #[serde(rename = "pdf-to-excel")]
    PdfToExcel,
    #[serde(rename = "jpg-to-pdf")]
    JpgToPdf,
    #[serde(rename = "png-to-pdf")]
    PngToPdf,
    #[serde(rename = "word-to-pdf")]
    WordToPdf,
    #[serde(rename = "powerpoint-to-pdf")]
    PowerpointToPdf,
    #[serde(rename = "excel-to-pdf")]
    ExcelToPdf,
}

impl ConversionType {
    pub const ALL: [ConversionType; 9] = [
        ConversionType::PdfToJpg,
        ConversionType::PdfToWord,
        ConversionType::PdfToPpt,
        ConversionType::PdfToExcel,
        ConversionType::JpgToPdf,
        ConversionType::PngToPdf,
        ConversionType::WordToPdf,
        ConversionType::PowerpointToPdf,
        ConversionType::ExcelToPdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionType::PdfToJpg => "pdf-to-jpg",
            ConversionType::PdfToWord => "pdf-to-word",
            ConversionType::PdfToPpt => "pdf-to-ppt",
            ConversionType::PdfToExcel => "pdf-to-excel",
            ConversionType::JpgToPdf => "jpg-to-pdf",
            ConversionType::PngToPdf => "png-to-pdf",
            ConversionType::WordToPdf => "word-to-pdf",
            ConversionType::PowerpointToPdf => "powerpoint-to-pdf",
            ConversionType::ExcelToPdf => "excel-to-pdf",
        }
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown conversion type: {0}")]
pub struct UnknownConversionType(pub String);

impl FromStr for ConversionType {
    type Err = UnknownConversionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ConversionType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == wanted)
            .ok_or_else(|| UnknownConversionType(s.to_string()))
    }
}

/// One piece of a multi-output conversion (e.g. one rendered page) waiting
/// to be archived or unwrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub path: PathBuf,
    pub extension: String,
}

/// What a handler hands back to the output strategy
#[derive(Debug, Clone)]
pub enum ConversionResult {
    Single { path: PathBuf, mime: Mime },
    /// Units in their original order; `mime` describes a single unit
    Units { units: Vec<OutputUnit>, mime: Mime },
}

impl ConversionResult {
    pub fn single(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        ConversionResult::Single { path, mime }
    }

    pub fn units(units: Vec<OutputUnit>, mime: Mime) -> Self {
        ConversionResult::Units { units, mime }
    }
}

impl OutputUnit {
    /// Unit whose extension is taken from the file name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        Self { path, extension }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_type_round_trips_wire_names() {
        for ty in ConversionType::ALL {
            assert_eq!(ty.as_str().parse::<ConversionType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_conversion_type() {
        let err = "foo-to-bar".parse::<ConversionType>().unwrap_err();
        assert_eq!(err, UnknownConversionType("foo-to-bar".to_string()));
        assert!("PDF-TO-JPG".parse::<ConversionType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&ConversionType::PowerpointToPdf).unwrap();
        assert_eq!(json, "\"powerpoint-to-pdf\"");

        let parsed: ConversionType = serde_json::from_str("\"pdf-to-excel\"").unwrap();
        assert_eq!(parsed, ConversionType::PdfToExcel);
    }

    #[test]
    fn test_single_guesses_mime_from_extension() {
        match ConversionResult::single("out/converted.docx") {
            ConversionResult::Single { mime, .. } => assert_eq!(
                mime.essence_str(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
