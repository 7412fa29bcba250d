//! Validation of generated XML documents.
//!
//! Two schema languages are supported and always chosen explicitly:
//!
//! - **DTD**: a native grammar engine ([`DtdValidator`]) that reads element
//!   and attribute declarations and matches content models with an NFA
//! - **XSD**: libxml2 schema validation ([`XsdValidator`])
//!
//! A schema is compiled once and can validate any number of documents. All
//! issues are collected, not just the first. A document that fails
//! validation yields `ValidationResult { valid: false, .. }`; a missing or
//! malformed schema is a [`ValidateError`] instead.

pub mod dtd;
mod error;
pub mod tree;
mod xsd;

use std::path::Path;
use std::time::Instant;

use grades_model::{Dataset, PipelineConfig, SchemaKind, ValidationResult};
use tracing::{info, info_span, warn};

pub use dtd::DtdValidator;
pub use error::{Result, ValidateError};
pub use tree::{XmlDocument, XmlElement, XmlNode, parse_document, read_document};
pub use xsd::XsdValidator;

/// A compiled schema of either kind.
pub enum SchemaValidator {
    Dtd(DtdValidator),
    Xsd(XsdValidator),
}

impl SchemaValidator {
    pub fn load(kind: SchemaKind, schema: &Path) -> Result<Self> {
        match kind {
            SchemaKind::Dtd => DtdValidator::from_file(schema).map(Self::Dtd),
            SchemaKind::Xsd => XsdValidator::from_file(schema).map(Self::Xsd),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Dtd(_) => SchemaKind::Dtd,
            Self::Xsd(_) => SchemaKind::Xsd,
        }
    }

    pub fn schema_path(&self) -> &Path {
        match self {
            Self::Dtd(validator) => validator.schema_path(),
            Self::Xsd(validator) => validator.schema_path(),
        }
    }

    /// Validate one document and log the outcome against this schema.
    pub fn validate(&mut self, document: &Path) -> Result<ValidationResult> {
        let result = match self {
            Self::Dtd(validator) => validator.validate(document),
            Self::Xsd(validator) => validator.validate(document),
        }?;
        if result.valid {
            info!(
                document = %document.display(),
                schema = %self.schema_path().display(),
                kind = %self.kind(),
                "document is valid"
            );
        } else {
            warn!(
                document = %document.display(),
                schema = %self.schema_path().display(),
                kind = %self.kind(),
                errors = result.error_count(),
                "document is invalid"
            );
            for issue in &result.issues {
                warn!(document = %document.display(), "{issue}");
            }
        }
        Ok(result)
    }
}

/// Validate `document` against `schema` using the given schema language.
pub fn validate_document(document: &Path, schema: &Path, kind: SchemaKind) -> Result<ValidationResult> {
    SchemaValidator::load(kind, schema)?.validate(document)
}

/// Result of validating one dataset document against one schema kind.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub dataset: Dataset,
    pub kind: SchemaKind,
    pub result: Result<ValidationResult>,
}

/// Validate each generated dataset document against its colocated schemas.
///
/// Outcomes are independent and ordered by dataset, then schema kind.
pub fn validate_all(
    config: &PipelineConfig,
    datasets: &[Dataset],
    kinds: &[SchemaKind],
) -> Vec<ValidationOutcome> {
    let mut outcomes = Vec::with_capacity(datasets.len() * kinds.len());
    for &dataset in datasets {
        let document = config.xml_path(dataset);
        for &kind in kinds {
            let span = info_span!("validate", dataset = %dataset, kind = %kind);
            let _guard = span.enter();
            let start = Instant::now();
            let schema = config.schema_path(dataset, kind);
            let result = validate_document(&document, &schema, kind);
            match &result {
                Ok(_) => info!(duration_ms = start.elapsed().as_millis(), "validation finished"),
                Err(error) => tracing::error!(
                    document = %document.display(),
                    schema = %schema.display(),
                    %error,
                    "validation failed"
                ),
            }
            outcomes.push(ValidationOutcome {
                dataset,
                kind,
                result,
            });
        }
    }
    outcomes
}
