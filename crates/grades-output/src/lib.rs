//! XML generation for the gradebook pipeline.
//!
//! Turns loaded tables into well-formed XML documents (one record element
//! per row, one child element per column) and writes them atomically.

mod convert;
mod document;
mod error;
mod fs;

pub use convert::{ConversionSummary, convert_all, convert_dataset};
pub use document::{serialize_table, write_document};
pub use error::{OutputError, Result};
pub use fs::{ensure_dir, write_atomic};
