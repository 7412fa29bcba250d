//! Module catalog read from the Modules document.

use std::path::Path;

use grades_model::{Dataset, ModuleCatalog, PipelineConfig};
use grades_validate::{XmlElement, read_document};

use crate::error::{ReportError, Result};

/// Record element holding one module row.
const MODULE_RECORD: &str = "Modules";
/// Child element carrying the module name.
const MODULE_NAME: &str = "MODULENAME";

/// Distinct module names found at `Modules/MODULENAME` (any depth), in
/// document order. Blank names are skipped.
pub fn list_modules(path: &Path) -> Result<ModuleCatalog> {
    let document = read_document(path).map_err(|error| ReportError::from_document(path, error))?;
    let names = document
        .root
        .descendants()
        .into_iter()
        .filter(|element| element.name == MODULE_RECORD)
        .flat_map(XmlElement::elements)
        .filter(|element| element.name == MODULE_NAME)
        .map(XmlElement::text);
    let catalog = ModuleCatalog::new(names);
    tracing::debug!(path = %path.display(), modules = catalog.len(), "listed modules");
    Ok(catalog)
}

/// Module catalog of the configured Modules document.
pub fn load_catalog(config: &PipelineConfig) -> Result<ModuleCatalog> {
    list_modules(&config.xml_path(Dataset::Modules))
}
