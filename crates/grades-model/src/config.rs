//! Pipeline configuration: every path a stage reads or writes.
//!
//! The configuration is built once (defaults, then an optional TOML file,
//! then command-line flags) and handed to each stage, so no component
//! recomputes directories on its own.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{DEFAULT_ROOT_ELEMENT, Dataset, DocumentSpec};
use crate::naming::safe_file_stem;
use crate::validation::SchemaKind;

/// Environment variable overriding the default data directory.
pub const DATA_DIR_ENV_VAR: &str = "GRADEBOOK_DATA_DIR";

/// Configuration file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "gradebook.toml";

/// Cohort tag appended to generated XML file names.
pub const DEFAULT_COHORT: &str = "GInf2";

/// File name prefix of generated reports.
pub const REPORT_PREFIX: &str = "GradesReport";

/// Spreadsheet extensions tried for each dataset, in order of preference.
pub const INPUT_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "ods", "csv"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub input_dir: PathBuf,
    pub xml_dir: PathBuf,
    pub html_dir: PathBuf,
    pub pdf_dir: PathBuf,
    pub schema_dir: PathBuf,
    pub stylesheet: PathBuf,
    pub cohort: String,
    pub root_element: String,
    /// Worksheet to read; the first sheet when unset.
    pub sheet: Option<String>,
}

impl PipelineConfig {
    /// Conventional layout under one data directory.
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let output_dir = data_dir.join("output");
        Self {
            input_dir: data_dir.join("input"),
            xml_dir: output_dir.join("xml"),
            html_dir: output_dir.join("html"),
            pdf_dir: output_dir.join("pdf"),
            schema_dir: data_dir.join("schemas"),
            stylesheet: data_dir.join("xslt").join("GradesReport.xsl"),
            cohort: DEFAULT_COHORT.to_string(),
            root_element: DEFAULT_ROOT_ELEMENT.to_string(),
            sheet: None,
            data_dir,
        }
    }

    /// Data directory from `GRADEBOOK_DATA_DIR`, falling back to `./data`.
    pub fn default_data_dir() -> PathBuf {
        match std::env::var(DATA_DIR_ENV_VAR) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => PathBuf::from("data"),
        }
    }

    /// Overlay values from a configuration file.
    ///
    /// Relative paths in the file are resolved against the data directory.
    pub fn apply(&mut self, file: &ConfigFile) {
        let resolve = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.data_dir.join(path)
            }
        };
        let paths = &file.paths;
        let input_dir = paths.input_dir.as_deref().map(resolve);
        let xml_dir = paths.xml_dir.as_deref().map(resolve);
        let html_dir = paths.html_dir.as_deref().map(resolve);
        let pdf_dir = paths.pdf_dir.as_deref().map(resolve);
        let schema_dir = paths.schema_dir.as_deref().map(resolve);
        let stylesheet = paths.stylesheet.as_deref().map(resolve);

        if let Some(dir) = input_dir {
            self.input_dir = dir;
        }
        if let Some(dir) = xml_dir {
            self.xml_dir = dir;
        }
        if let Some(dir) = html_dir {
            self.html_dir = dir;
        }
        if let Some(dir) = pdf_dir {
            self.pdf_dir = dir;
        }
        if let Some(dir) = schema_dir {
            self.schema_dir = dir;
        }
        if let Some(path) = stylesheet {
            self.stylesheet = path;
        }
        if let Some(cohort) = &file.cohort {
            self.cohort = cohort.clone();
        }
        if let Some(root) = &file.root_element {
            self.root_element = root.clone();
        }
        if let Some(sheet) = &file.sheet {
            self.sheet = Some(sheet.clone());
        }
    }

    /// Candidate source files for a dataset, in probing order.
    pub fn input_candidates(&self, dataset: Dataset) -> Vec<PathBuf> {
        let stem = dataset.stem();
        INPUT_EXTENSIONS
            .iter()
            .map(|ext| self.input_dir.join(format!("{stem}.{ext}")))
            .collect()
    }

    /// First existing source file for a dataset, or the `.xlsx` path when
    /// none exists (so the loader reports the conventional name).
    pub fn input_path(&self, dataset: Dataset) -> PathBuf {
        let candidates = self.input_candidates(dataset);
        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .unwrap_or_else(|| candidates[0].clone())
    }

    pub fn xml_path(&self, dataset: Dataset) -> PathBuf {
        self.xml_dir.join(dataset.xml_file_name(&self.cohort))
    }

    pub fn schema_path(&self, dataset: Dataset, kind: SchemaKind) -> PathBuf {
        self.schema_dir
            .join(format!("{}.{}", dataset.stem(), kind.extension()))
    }

    pub fn document_spec(&self, dataset: Dataset) -> DocumentSpec {
        dataset.document_spec(&self.root_element)
    }

    pub fn html_report_path(&self, module: &str) -> PathBuf {
        self.html_dir.join(format!("{}.html", report_file_stem(module)))
    }

    pub fn pdf_report_path(&self, module: &str) -> PathBuf {
        self.pdf_dir.join(format!("{}.pdf", report_file_stem(module)))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_data_dir(Self::default_data_dir())
    }
}

/// `GradesReport_<module with non-alphanumerics replaced>`.
pub fn report_file_stem(module: &str) -> String {
    format!("{REPORT_PREFIX}_{}", safe_file_stem(module))
}

/// Contents of `gradebook.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub cohort: Option<String>,
    pub root_element: Option<String>,
    pub sheet: Option<String>,
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub input_dir: Option<PathBuf>,
    pub xml_dir: Option<PathBuf>,
    pub html_dir: Option<PathBuf>,
    pub pdf_dir: Option<PathBuf>,
    pub schema_dir: Option<PathBuf>,
    pub stylesheet: Option<PathBuf>,
}
