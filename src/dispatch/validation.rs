//! Upload admission: extension allow-list and file name sanitization.

use super::error::ClientError;

/// Extensions accepted by any handler, lower-case
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "doc", "docx", "ppt", "pptx", "xls", "xlsx",
];

/// Lower-cased text after the last `.`, if the name has one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Check the client-supplied name and return its (lower-case) extension.
pub fn validate_upload(file_name: &str) -> Result<String, ClientError> {
    if file_name.trim().is_empty() {
        return Err(ClientError::EmptyFileName);
    }

    match extension_of(file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ClientError::DisallowedExtension {
            file_name: file_name.to_string(),
        }),
    }
}

/// A safe basename for the saved upload.
///
/// Path separators become word breaks, whitespace runs become `_`, and only
/// ASCII letters, digits, `.`, `_` and `-` survive. Leading and trailing
/// dots and underscores are stripped. Names that lose their extension (or
/// everything) fall back to `upload.<extension>`.
pub fn sanitize_filename(file_name: &str, extension: &str) -> String {
    let spaced = file_name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    let suffix = format!(".{extension}");
    let has_stem = trimmed.len() > suffix.len();
    if has_stem && trimmed.to_ascii_lowercase().ends_with(&suffix) {
        trimmed.to_string()
    } else {
        format!("upload{suffix}")
    }
}
