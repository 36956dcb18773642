//! Input CSV loading

use std::collections::HashMap;
use std::path::Path;

use crate::error::{RunnerError, RunnerResult};
use crate::types::{InputRow, IDENTITY_COLUMNS};

const UTF8_BOM: char = '\u{feff}';

/// Pick `;` or `,` by counting both in the header line; ties go to `;`
pub fn detect_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons >= commas { b';' } else { b',' }
}

/// Read every data row of the CSV at `path`
pub fn load_rows(path: &Path) -> RunnerResult<Vec<InputRow>> {
    let content = std::fs::read_to_string(path)?;
    parse_rows(&content, &path.display().to_string())
}

/// Parse CSV text into rows; `source` names the input in error messages
///
/// Returns an empty vector for header-only input. Rows shorter than the
/// header simply lack the trailing columns.
pub fn parse_rows(content: &str, source: &str) -> RunnerResult<Vec<InputRow>> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let header_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(InputRow::new(fields));
    }

    if !rows.is_empty() {
        let missing: Vec<String> = IDENTITY_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RunnerError::MissingColumns {
                path: source.to_string(),
                missing,
            });
        }
    }

    Ok(rows)
}
