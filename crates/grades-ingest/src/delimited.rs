//! Delimited (CSV) sources.

use std::path::Path;

use csv::ReaderBuilder;
use grades_model::{CellValue, Table};

use crate::error::{IngestError, Result};
use crate::header::build_headers;

/// Read a CSV file: the first non-empty row is the header.
///
/// Cell text is kept verbatim; only an empty cell becomes
/// [`CellValue::Empty`].
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|error| csv_error(path, error))?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| csv_error(path, error))?;
        if headers.is_none() {
            if !record.iter().all(|value| value.trim().is_empty()) {
                headers = Some(build_headers(record.iter()));
            }
            continue;
        }
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(CellValue::text)
                .collect(),
        );
    }
    let Some(headers) = headers else {
        return Err(IngestError::NoHeaderRow {
            path: path.to_path_buf(),
        });
    };
    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row);
    }
    Ok(table)
}

fn csv_error(path: &Path, error: csv::Error) -> IngestError {
    if let csv::ErrorKind::Io(io) = error.kind()
        && io.kind() == std::io::ErrorKind::NotFound
    {
        return IngestError::FileNotFound {
            path: path.to_path_buf(),
        };
    }
    IngestError::CsvParse {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
