//! Tabular loading for the gradebook pipeline.
//!
//! Reads a spreadsheet-like source (rows of named fields) into a
//! [`grades_model::Table`], preserving row order and column order.
//!
//! # Formats
//!
//! - **Spreadsheets**: `.xlsx`, `.xlsm`, `.xls`, `.ods` (first worksheet
//!   unless a sheet is named)
//! - **CSV**: `.csv`
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use grades_ingest::{LoadOptions, read_table};
//!
//! let table = read_table(Path::new("data/input/Notes.xlsx"), &LoadOptions::default())?;
//! println!("{} rows x {} columns", table.height(), table.width());
//! ```

mod delimited;
mod error;
mod header;
mod workbook;

use std::path::Path;

use grades_model::{Dataset, PipelineConfig, Table};

// === Error Types ===
pub use error::{IngestError, Result};

// === Readers ===
pub use delimited::read_csv;
pub use header::{build_headers, normalize_header};
pub use workbook::read_workbook;

/// Options for reading a tabular source.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Worksheet name for spreadsheet sources.
    pub sheet: Option<String>,
}

impl LoadOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            sheet: config.sheet.clone(),
        }
    }
}

/// Read a tabular source, choosing the reader from the file extension.
pub fn read_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, options.sheet.as_deref()),
        "csv" => read_csv(path),
        _ => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

/// Load the source table of a dataset from the configured input directory.
pub fn load_dataset(config: &PipelineConfig, dataset: Dataset) -> Result<Table> {
    let path = config.input_path(dataset);
    let table = read_table(&path, &LoadOptions::from_config(config))?;
    tracing::info!(
        dataset = %dataset,
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "loaded source table"
    );
    Ok(table)
}
