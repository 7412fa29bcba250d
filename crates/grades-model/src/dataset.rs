//! The three datasets handled by the pipeline and their document layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::naming::capitalize;

/// Root element used by every generated document.
pub const DEFAULT_ROOT_ELEMENT: &str = "Root";

/// Source datasets, in the order they are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Students,
    Modules,
    Notes,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Students, Dataset::Modules, Dataset::Notes];

    /// Lower-case key (`students`, `modules`, `notes`).
    pub fn key(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Modules => "modules",
            Self::Notes => "notes",
        }
    }

    /// File stem shared by the source spreadsheet and the schemas.
    pub fn stem(self) -> String {
        capitalize(self.key())
    }

    /// Element name wrapping one record of this dataset.
    pub fn record_element(self) -> String {
        capitalize(self.key())
    }

    /// Generated XML file name for a cohort (`Notes_GInf2.xml`).
    pub fn xml_file_name(self, cohort: &str) -> String {
        if cohort.is_empty() {
            format!("{}.xml", self.stem())
        } else {
            format!("{}_{cohort}.xml", self.stem())
        }
    }

    pub fn document_spec(self, root: &str) -> DocumentSpec {
        DocumentSpec::new(root, self.record_element())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "students" | "student" => Ok(Self::Students),
            "modules" | "module" => Ok(Self::Modules),
            "notes" | "note" | "grades" => Ok(Self::Notes),
            other => Err(format!("unknown dataset '{other}'")),
        }
    }
}

/// Element names of a generated document: one root, repeated record elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    pub root_element: String,
    pub record_element: String,
}

impl DocumentSpec {
    pub fn new(root_element: impl Into<String>, record_element: impl Into<String>) -> Self {
        Self {
            root_element: root_element.into(),
            record_element: record_element.into(),
        }
    }
}
