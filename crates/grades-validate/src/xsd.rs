//! XSD validation through libxml2.

use std::path::{Path, PathBuf};

use grades_model::{SchemaKind, ValidationIssue, ValidationResult};
use libxml::error::StructuredError;
use libxml::parser::Parser;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};

use crate::error::{Result, ValidateError};
use crate::tree::read_document;

/// A compiled XML Schema, reusable across documents.
pub struct XsdValidator {
    path: PathBuf,
    context: SchemaValidationContext,
}

impl XsdValidator {
    pub fn from_file(path: &Path) -> Result<Self> {
        std::fs::metadata(path).map_err(|source| ValidateError::schema_io(path, source))?;
        let location = path_str(path).map_err(|message| ValidateError::InvalidSchema {
            path: path.to_path_buf(),
            line: None,
            message,
        })?;
        let mut parser = SchemaParserContext::from_file(location);
        let context = SchemaValidationContext::from_parser(&mut parser).map_err(|errors| {
            let first = errors.first();
            ValidateError::InvalidSchema {
                path: path.to_path_buf(),
                line: first.and_then(error_line),
                message: join_messages(&errors),
            }
        })?;
        tracing::debug!(schema = %path.display(), "compiled XSD");
        Ok(Self {
            path: path.to_path_buf(),
            context,
        })
    }

    pub fn schema_path(&self) -> &Path {
        &self.path
    }

    pub fn validate(&mut self, document: &Path) -> Result<ValidationResult> {
        // Well-formedness is checked by the same reader as DTD mode, so both
        // modes report malformed documents identically.
        read_document(document)?;
        let location = path_str(document).map_err(|message| ValidateError::MalformedDocument {
            path: document.to_path_buf(),
            line: 1,
            message,
        })?;
        let parsed = Parser::default()
            .parse_file(location)
            .map_err(|error| ValidateError::MalformedDocument {
                path: document.to_path_buf(),
                line: 1,
                message: format!("{error:?}"),
            })?;
        let issues = match self.context.validate_document(&parsed) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(to_issue).collect(),
        };
        Ok(ValidationResult::new(
            document,
            &self.path,
            SchemaKind::Xsd,
            issues,
        ))
    }
}

fn path_str(path: &Path) -> std::result::Result<&str, String> {
    path.to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {}", path.display()))
}

fn error_line(error: &StructuredError) -> Option<u32> {
    error
        .line
        .and_then(|line| u32::try_from(line).ok())
        .filter(|line| *line > 0)
}

fn error_message(error: &StructuredError) -> String {
    error
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or("schema validation error")
        .to_string()
}

fn join_messages(errors: &[StructuredError]) -> String {
    if errors.is_empty() {
        return "schema could not be compiled".to_string();
    }
    errors
        .iter()
        .map(error_message)
        .collect::<Vec<_>>()
        .join("; ")
}

fn to_issue(error: &StructuredError) -> ValidationIssue {
    let column = error
        .col
        .and_then(|col| u32::try_from(col).ok())
        .filter(|col| *col > 0);
    ValidationIssue::new(error_line(error), error_message(error)).with_column(column)
}
