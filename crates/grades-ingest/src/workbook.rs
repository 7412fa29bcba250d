//! Spreadsheet sources (xlsx, xlsm, xls, ods) read with calamine.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDateTime, NaiveTime};
use grades_model::{CellValue, Table};

use crate::error::{IngestError, Result};
use crate::header::build_headers;

/// Read one worksheet (the first when `sheet` is `None`).
///
/// The first non-blank row is the header; fully empty rows are skipped.
/// String cells are kept verbatim.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table> {
    std::fs::metadata(path).map_err(|source| IngestError::from_io(path, source))?;
    let mut workbook = open_workbook_auto(path).map_err(|error| IngestError::Workbook {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|known| known.as_str() == name)
            .cloned()
            .ok_or_else(|| IngestError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: name.to_string(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::NoHeaderRow {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|error| IngestError::Workbook {
            path: path.to_path_buf(),
            message: format!("sheet '{sheet_name}': {error}"),
        })?;

    let mut rows = range.rows();
    let header_row = rows
        .by_ref()
        .find(|row| !row.iter().all(|cell| cell_value(cell).to_text().trim().is_empty()))
        .ok_or_else(|| IngestError::NoHeaderRow {
            path: path.to_path_buf(),
        })?;
    let raw_headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_value(cell).to_text())
        .collect();
    let mut table = Table::new(build_headers(raw_headers.iter().map(String::as_str)));
    for row in rows.filter(|row| !row.iter().all(|cell| cell_value(cell).is_empty())) {
        table.push_row(row.iter().map(cell_value).collect());
    }
    tracing::debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = table.height(),
        columns = table.width(),
        "read worksheet"
    );
    Ok(table)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(value) => CellValue::text(value.as_str()),
        Data::Int(value) => CellValue::Integer(*value),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => value
            .as_datetime()
            .map_or(CellValue::Number(value.as_f64()), |datetime| {
                CellValue::Text(format_datetime(datetime))
            }),
        other => CellValue::text(other.to_string()),
    }
}

/// ISO date, with the time part only when it is not midnight.
fn format_datetime(value: NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}
