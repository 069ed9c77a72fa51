//! Table extraction through tabula-java's JSON output.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ToolError;
use super::process::ExternalCommand;

/// Rows of cell text, as extracted
pub type Table = Vec<Vec<String>>;

#[derive(Debug, Clone)]
pub struct TableExtractor {
    java: String,
    jar: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    data: Vec<Vec<RawCell>>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    text: String,
}

impl TableExtractor {
    pub fn new(java: impl Into<String>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    /// Every table on every page, in document order. Tables without any
    /// non-empty cell are dropped.
    pub async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, ToolError> {
        let output = ExternalCommand::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .arg("--pages")
            .arg("all")
            .arg("--format")
            .arg("JSON")
            .arg(pdf)
            .run()
            .await?;

        parse_tables(&output.stdout).map_err(|e| ToolError::InvalidOutput {
            program: format!("{} -jar {}", self.java, self.jar.display()),
            detail: e.to_string(),
        })
    }
}

pub fn parse_tables(json: &[u8]) -> Result<Vec<Table>, serde_json::Error> {
    let raw: Vec<RawTable> = serde_json::from_slice(json)?;

    Ok(raw
        .into_iter()
        .map(|table| {
            table
                .data
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.text).collect::<Vec<_>>())
                .collect::<Table>()
        })
        .filter(|table| table.iter().flatten().any(|cell| !cell.trim().is_empty()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tabula_json() {
        let json = br#"[
            {"extraction_method": "lattice", "top": 10.0, "data": [
                [{"top": 1.0, "text": "Name"}, {"top": 1.0, "text": "Qty"}],
                [{"top": 2.0, "text": "Bolt"}, {"top": 2.0, "text": "12"}]
            ]},
            {"extraction_method": "stream", "data": [[{"text": ""}]]},
            {"extraction_method": "stream", "data": [[{"text": "Total"}, {"text": "12"}]]}
        ]"#;

        let tables = parse_tables(json).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][0], ["Name", "Qty"]);
        assert_eq!(tables[0][1], ["Bolt", "12"]);
        assert_eq!(tables[1], vec![vec!["Total".to_string(), "12".to_string()]]);
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_tables(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_tables(b"Error: unable to open file").is_err());
    }
}
