//! Shared types for the gradebook pipeline.

pub mod config;
pub mod dataset;
pub mod error;
pub mod module;
pub mod naming;
pub mod table;
pub mod validation;
pub mod value;

pub use config::{ConfigFile, PathsSection, PipelineConfig, report_file_stem};
pub use dataset::{DEFAULT_ROOT_ELEMENT, Dataset, DocumentSpec};
pub use error::ErrorKind;
pub use module::{ModuleCatalog, ModuleFilter};
pub use naming::{
    InvalidElementName, capitalize, element_name_for_column, is_xml_name, safe_file_stem,
    sanitize_column_name,
};
pub use table::{Record, Table};
pub use validation::{SchemaKind, ValidationIssue, ValidationResult};
pub use value::{CellValue, format_number};
