//! CSV ingest.
//!
//! Reads two named columns out of a CSV file as **raw strings**. Parsing is
//! left to the orchestrator so malformed cells are reported with the same
//! `ParseError` (axis + index) as values typed on the command line.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;

/// Raw x/y columns pulled from a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumns {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub rows_read: usize,
}

/// Load the `x_col` and `y_col` columns from a CSV file with a header row.
pub fn read_xy_columns(path: &Path, x_col: &str, y_col: &str) -> Result<RawColumns, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_xy_from_reader(file, x_col, y_col)
}

/// Same as `read_xy_columns` for any reader.
pub fn read_xy_from_reader<R: Read>(reader: R, x_col: &str, y_col: &str) -> Result<RawColumns, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let x_idx = column_index(&headers, x_col)?;
    let y_idx = column_index(&headers, y_col)?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut rows_read = 0usize;

    for (i, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let record = record.map_err(|e| AppError::new(2, format!("Failed to read CSV line {line}: {e}")))?;
        rows_read += 1;

        // Short rows yield an empty cell, which the orchestrator rejects as a
        // parse error at that index.
        x.push(record.get(x_idx).unwrap_or("").to_string());
        y.push(record.get(y_idx).unwrap_or("").to_string());
    }

    log::debug!("read {rows_read} rows from CSV (columns '{x_col}', '{y_col}')");

    Ok(RawColumns { x, y, rows_read })
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, AppError> {
    let wanted = name.trim().to_ascii_lowercase();
    headers
        .iter()
        .position(|h| h.trim().to_ascii_lowercase() == wanted)
        .ok_or_else(|| {
            let available: Vec<&str> = headers.iter().collect();
            AppError::new(
                2,
                format!("CSV has no '{name}' column (available: {}).", available.join(", ")),
            )
        })
}
