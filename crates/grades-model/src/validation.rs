use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Schema language used to validate a document.
///
/// The two kinds are never inferred from a file extension: the caller picks
/// one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Grammar-based validation (element and attribute declarations).
    Dtd,
    /// Typed validation (data types and cardinality).
    Xsd,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 2] = [SchemaKind::Dtd, SchemaKind::Xsd];

    /// Extension of the colocated schema file for a dataset.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dtd => "dtd",
            Self::Xsd => "xsd",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dtd => "DTD",
            Self::Xsd => "XSD",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SchemaKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "dtd" => Ok(Self::Dtd),
            "xsd" => Ok(Self::Xsd),
            other => Err(format!("unknown schema kind '{other}'")),
        }
    }
}

/// One validation error reported against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 1-based line of the offending node, when known.
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: Option<u32>) -> Self {
        self.column = column;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "line {line}:{column}: {}", self.message),
            (Some(line), None) => write!(f, "line {line}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Outcome of checking one document against one schema.
///
/// A document that fails validation is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub document: PathBuf,
    pub schema: PathBuf,
    pub kind: SchemaKind,
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new(
        document: impl Into<PathBuf>,
        schema: impl Into<PathBuf>,
        kind: SchemaKind,
        issues: Vec<ValidationIssue>,
    ) -> Self {
        Self {
            document: document.into(),
            schema: schema.into(),
            kind,
            valid: issues.is_empty(),
            issues,
        }
    }

    pub fn error_count(&self) -> usize {
        self.issues.len()
    }
}
