//! Spreadsheet-to-XML conversion for the configured datasets.

use std::path::PathBuf;
use std::time::Instant;

use grades_ingest::load_dataset;
use grades_model::{Dataset, PipelineConfig};
use tracing::{info, info_span};

use crate::document::write_document;
use crate::error::Result;

/// Outcome of converting one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub dataset: Dataset,
    pub output: PathBuf,
    pub records: usize,
    pub columns: usize,
    pub bytes: usize,
}

/// Load a dataset's source table and write its XML document.
pub fn convert_dataset(config: &PipelineConfig, dataset: Dataset) -> Result<ConversionSummary> {
    let span = info_span!("convert", dataset = %dataset);
    let _guard = span.enter();
    let start = Instant::now();

    let table = load_dataset(config, dataset)?;
    let output = config.xml_path(dataset);
    let bytes = write_document(&table, &config.document_spec(dataset), &output)?;

    info!(
        output = %output.display(),
        records = table.height(),
        duration_ms = start.elapsed().as_millis(),
        "wrote XML document"
    );
    Ok(ConversionSummary {
        dataset,
        output,
        records: table.height(),
        columns: table.width(),
        bytes,
    })
}

/// Convert each dataset independently.
///
/// A failure on one dataset does not stop the others; every outcome is
/// returned in input order.
pub fn convert_all(
    config: &PipelineConfig,
    datasets: &[Dataset],
) -> Vec<(Dataset, Result<ConversionSummary>)> {
    datasets
        .iter()
        .map(|&dataset| {
            let outcome = convert_dataset(config, dataset);
            if let Err(error) = &outcome {
                tracing::error!(dataset = %dataset, %error, "conversion failed");
            }
            (dataset, outcome)
        })
        .collect()
}
