use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_upload_bytes must be positive")]
    ZeroUploadLimit,

    #[error("upload_dir and output_dir must differ (both are '{path}')")]
    SharedDirectories { path: String },

    #[error("Conversion timeout must be positive")]
    ZeroTimeout,

    #[error("Resolution must be positive: {field} = 0")]
    ZeroDpi { field: String },

    #[error("jpg_quality must be between 1 and 100, got {value}")]
    InvalidJpegQuality { value: u8 },

    #[error("Tool program for '{tool}' is empty")]
    EmptyToolProgram { tool: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_conversion(config)?;
    validate_tools(config)?;
    Ok(())
}

/// Upload cap and request directory roots
fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_upload_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroUploadLimit);
    }

    // Both roots get a directory named after the request id
    if config.server.upload_dir == config.server.output_dir {
        return Err(ValidationError::SharedDirectories {
            path: config.server.upload_dir.display().to_string(),
        });
    }

    Ok(())
}

fn validate_conversion(config: &Config) -> Result<(), ValidationError> {
    let conversion = &config.conversion;

    if conversion.timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout);
    }

    for (field, value) in [
        ("jpg_dpi", conversion.jpg_dpi),
        ("slide_dpi", conversion.slide_dpi),
        ("image_pdf_dpi", conversion.image_pdf_dpi),
    ] {
        if value == 0 {
            return Err(ValidationError::ZeroDpi {
                field: field.to_string(),
            });
        }
    }

    if !(1..=100).contains(&conversion.jpg_quality) {
        return Err(ValidationError::InvalidJpegQuality {
            value: conversion.jpg_quality,
        });
    }

    Ok(())
}

fn validate_tools(config: &Config) -> Result<(), ValidationError> {
    let tools = &config.tools;
    let tabula_jar = tools.tabula_jar.to_string_lossy();

    for (tool, program) in [
        ("pdftoppm", tools.pdftoppm.as_str()),
        ("pdf2docx", tools.pdf2docx.as_str()),
        ("java", tools.java.as_str()),
        ("tabula_jar", tabula_jar.as_ref()),
        ("libreoffice", tools.libreoffice.as_str()),
    ] {
        if program.trim().is_empty() {
            return Err(ValidationError::EmptyToolProgram {
                tool: tool.to_string(),
            });
        }
    }

    Ok(())
}
