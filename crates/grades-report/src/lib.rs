//! Grade reports for the gradebook pipeline.
//!
//! - [`list_modules`] reads the distinct module names from the Modules
//!   document so a user can pick one.
//! - [`ReportTransform`] runs the XSLT report filter over the Notes
//!   document for one module and returns HTML.
//! - [`ReportGenerator`] ties both together, writing the HTML report and an
//!   optional PDF rendering of it under the configured output directories.

mod error;
mod generator;
mod html;
mod modules;
pub mod pdf;
mod transform;

pub use error::{ReportError, Result};
pub use generator::{ReportArtifacts, ReportGenerator, ReportOptions, render_pdf};
pub use html::parse_blocks;
pub use modules::{list_modules, load_catalog};
pub use transform::{
    PARAM_GENERATED_ON, PARAM_MODULE_FILTER, PARAM_STUDENTS_FILE, ReportParams, ReportTransform,
    xpath_string_literal,
};

#[cfg(test)]
static LIBXML: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// libxml2 keeps global parser state; unit tests using it run one at a time.
#[cfg(test)]
fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    LIBXML.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
