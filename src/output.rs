//! Single file or archive: the one policy every handler's result goes through.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mime::Mime;
use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::handlers::{ConversionResult, OutputUnit};
use crate::scope::{FileRole, Scope, ScopeError};

/// Name of the zip written for multi-unit results
const ARCHIVE_NAME: &str = "converted_images.zip";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("conversion produced no output")]
    NoOutput,

    #[error("handler returned an output it does not own: {0}")]
    Untracked(#[from] ScopeError),

    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The file to promote and how to describe it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalOutput {
    pub path: PathBuf,
    pub mime: Mime,
}

/// Turn a handler result into exactly one file tracked as output.
///
/// A single result must already be tracked by the handler; it is retagged
/// as output. A single unit is renamed to `converted.<ext>`; several units
/// are zipped as `page_<n>.<ext>` entries in their original order.
pub async fn finalize(
    result: ConversionResult,
    scope: &mut Scope,
) -> Result<FinalOutput, OutputError> {
    match result {
        ConversionResult::Single { path, mime } => {
            scope.retag(&path, FileRole::Output)?;
            Ok(FinalOutput { path, mime })
        }
        ConversionResult::Units { mut units, mime } => match units.len() {
            0 => Err(OutputError::NoOutput),
            1 => {
                let unit = units.remove(0);
                let dest = scope.work_path(&unit_name("converted", &unit));
                if dest == unit.path {
                    scope.retag(&dest, FileRole::Output)?;
                } else {
                    tokio::fs::rename(&unit.path, &dest).await?;
                    scope.forget(&unit.path);
                    scope.track(&dest, FileRole::Output);
                }
                debug!(path = %dest.display(), "Unwrapped single output unit");
                Ok(FinalOutput { path: dest, mime })
            }
            count => {
                let dest = scope.work_path(ARCHIVE_NAME);
                // Tracked before writing so a half-written archive is removed
                scope.track(&dest, FileRole::Output);

                let zip_path = dest.clone();
                tokio::task::spawn_blocking(move || write_archive(&units, &zip_path)).await??;

                debug!(path = %dest.display(), entries = count, "Archived output units");
                Ok(FinalOutput {
                    path: dest,
                    mime: zip_mime(),
                })
            }
        },
    }
}

fn zip_mime() -> Mime {
    mime_guess::from_ext("zip").first_or_octet_stream()
}

fn unit_name(stem: &str, unit: &OutputUnit) -> String {
    if unit.extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{}", unit.extension)
    }
}

fn write_archive(units: &[OutputUnit], dest: &Path) -> Result<(), OutputError> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(dest)?));
    // Page images are already compressed
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (i, unit) in units.iter().enumerate() {
        zip.start_file(unit_name(&format!("page_{}", i + 1), unit), options)?;
        std::io::copy(&mut File::open(&unit.path)?, &mut zip)?;
    }

    zip.finish()?.flush()?;
    Ok(())
}
