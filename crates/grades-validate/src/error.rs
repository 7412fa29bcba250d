use std::path::PathBuf;

use grades_model::ErrorKind;
use thiserror::Error;

/// Errors raised while reading documents or schemas.
///
/// A document that is well-formed but does not satisfy its schema is not an
/// error; it yields an invalid [`grades_model::ValidationResult`].
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("document not found: {path}")]
    DocumentNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("{path}:{line}: malformed XML: {message}")]
    MalformedDocument {
        path: PathBuf,
        line: u32,
        message: String,
    },

    #[error("schema not found: {path}")]
    SchemaNotFound { path: PathBuf },

    #[error("failed to read schema {path}: {source}")]
    SchemaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema itself cannot be compiled.
    #[error("invalid schema {path}: {message}")]
    InvalidSchema {
        path: PathBuf,
        line: Option<u32>,
        message: String,
    },
}

impl ValidateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DocumentNotFound { .. } => ErrorKind::NotFound,
            Self::DocumentRead { .. } => ErrorKind::Io,
            Self::MalformedDocument { .. } => ErrorKind::Parse,
            Self::SchemaNotFound { .. } | Self::SchemaRead { .. } | Self::InvalidSchema { .. } => {
                ErrorKind::Schema
            }
        }
    }

    pub(crate) fn document_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::DocumentNotFound { path }
        } else {
            Self::DocumentRead { path, source }
        }
    }

    pub(crate) fn schema_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::SchemaNotFound { path }
        } else {
            Self::SchemaRead { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidateError>;
