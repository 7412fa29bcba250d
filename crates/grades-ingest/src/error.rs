//! Error types for tabular loading.

use std::path::PathBuf;

use grades_model::ErrorKind;
use thiserror::Error;

/// Errors that can occur while loading a tabular source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file not found.
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension is not a supported tabular format.
    #[error("unsupported tabular format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Failed to parse CSV.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to open or decode a workbook.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Requested worksheet is absent.
    #[error("worksheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    /// Source has no non-empty row to use as header.
    #[error("no header row in {path}")]
    NoHeaderRow { path: PathBuf },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } => ErrorKind::NotFound,
            Self::FileRead { .. } => ErrorKind::Io,
            Self::UnsupportedFormat { .. }
            | Self::CsvParse { .. }
            | Self::Workbook { .. }
            | Self::SheetNotFound { .. }
            | Self::NoHeaderRow { .. } => ErrorKind::Parse,
        }
    }

    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source }
        }
    }
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, IngestError>;
