use grades_model::{Dataset, SchemaKind, ValidationResult};
use grades_validate::ValidationOutcome;
use serde::Serialize;

/// JSON document written by `validate --report`.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub entries: Vec<ValidationEntry>,
}

#[derive(Debug, Serialize)]
pub struct ValidationEntry {
    pub dataset: Dataset,
    pub kind: SchemaKind,
    pub status: EntryStatus,
    /// Present when the schema or document could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ValidationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Valid,
    Invalid,
    Error,
}

impl ValidationReport {
    pub fn from_outcomes(outcomes: &[ValidationOutcome]) -> Self {
        let entries: Vec<ValidationEntry> = outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(result) => ValidationEntry {
                    dataset: outcome.dataset,
                    kind: outcome.kind,
                    status: if result.valid {
                        EntryStatus::Valid
                    } else {
                        EntryStatus::Invalid
                    },
                    error: None,
                    result: Some(result.clone()),
                },
                Err(error) => ValidationEntry {
                    dataset: outcome.dataset,
                    kind: outcome.kind,
                    status: EntryStatus::Error,
                    error: Some(format!("{}: {error}", error.kind())),
                    result: None,
                },
            })
            .collect();
        Self {
            valid: entries
                .iter()
                .all(|entry| entry.status == EntryStatus::Valid),
            entries,
        }
    }
}
