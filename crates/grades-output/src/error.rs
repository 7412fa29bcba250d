use std::path::PathBuf;

use grades_ingest::IngestError;
use grades_model::{ErrorKind, InvalidElementName};
use thiserror::Error;

/// Errors raised while generating or writing documents.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A column header cannot become an element name.
    #[error(transparent)]
    InvalidColumn(#[from] InvalidElementName),

    /// Root or record element name is not a valid XML name.
    #[error("invalid {role} element name '{name}'")]
    InvalidElement { role: &'static str, name: String },

    /// A value holds a character XML 1.0 cannot carry.
    #[error("row {row}, column '{column}': character U+{code:04X} is not allowed in XML")]
    InvalidCharacter {
        row: usize,
        column: String,
        code: u32,
    },

    /// The XML writer failed while building the document.
    #[error("failed to serialize XML: {message}")]
    Serialize { message: String },

    /// Writing the output file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Loading the source table failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl OutputError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidColumn(_) | Self::InvalidElement { .. } | Self::InvalidCharacter { .. } => {
                ErrorKind::Parse
            }
            Self::Serialize { .. } | Self::Write { .. } => ErrorKind::Io,
            Self::Ingest(error) => error.kind(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, OutputError>;
