use std::path::{Path, PathBuf};

use grades_model::ErrorKind;
use grades_output::OutputError;
use grades_validate::ValidateError;
use thiserror::Error;

/// Errors raised while listing modules or producing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input document is not well-formed XML.
    #[error("XML syntax error in {path}: {message}")]
    XmlSyntax { path: PathBuf, message: String },

    /// The stylesheet cannot be parsed or compiled.
    #[error("failed to parse stylesheet {path}: {message}")]
    StylesheetParse { path: PathBuf, message: String },

    /// The stylesheet failed while running.
    #[error("failed to apply stylesheet {path}: {message}")]
    TransformApply { path: PathBuf, message: String },

    /// The HTML report cannot be laid out as PDF.
    #[error("failed to render PDF: {message}")]
    Render { message: String },

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Read { .. } => ErrorKind::Io,
            Self::XmlSyntax { .. } => ErrorKind::Parse,
            Self::StylesheetParse { .. } | Self::TransformApply { .. } => ErrorKind::Transform,
            Self::Render { .. } => ErrorKind::Render,
            Self::Output(error) => error.kind(),
        }
    }

    pub(crate) fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Classify a failure to read an input XML document.
    pub(crate) fn from_document(path: &Path, error: ValidateError) -> Self {
        match error {
            ValidateError::DocumentNotFound { path } => Self::NotFound { path },
            ValidateError::DocumentRead { path, source } => Self::Read { path, source },
            ValidateError::MalformedDocument {
                path,
                line,
                message,
            } => Self::XmlSyntax {
                path,
                message: format!("line {line}: {message}"),
            },
            other => Self::XmlSyntax {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_documents_are_syntax_errors() {
        let error = ReportError::from_document(
            Path::new("Notes.xml"),
            ValidateError::MalformedDocument {
                path: PathBuf::from("Notes.xml"),
                line: 3,
                message: "unexpected end tag".into(),
            },
        );
        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(
            error.to_string(),
            "XML syntax error in Notes.xml: line 3: unexpected end tag"
        );
    }

    #[test]
    fn stylesheet_errors_are_transform_errors() {
        let error = ReportError::StylesheetParse {
            path: PathBuf::from("GradesReport.xsl"),
            message: "bad".into(),
        };
        assert_eq!(error.kind(), ErrorKind::Transform);
    }
}
