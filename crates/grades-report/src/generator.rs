//! Per-module report generation: XSLT to HTML, then HTML to PDF.

use std::path::PathBuf;
use std::time::Instant;

use grades_model::{Dataset, ModuleFilter, PipelineConfig};
use grades_output::write_atomic;
use tracing::info_span;

use crate::error::{ReportError, Result};
use crate::html::parse_blocks;
use crate::pdf::render_blocks;
use crate::transform::{ReportParams, ReportTransform};

/// Render an HTML report as PDF bytes.
pub fn render_pdf(html: &str, title: &str) -> Result<Vec<u8>> {
    let blocks = parse_blocks(html)?;
    render_blocks(&blocks, title)
}

/// Switches for [`ReportGenerator`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Bind the Students document so the report can show student names.
    pub include_students: bool,
    pub render_pdf: bool,
    /// Date printed in the report footer; today when `None`.
    pub generated_on: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_students: true,
            render_pdf: true,
            generated_on: None,
        }
    }
}

/// Files written for one module.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub module: ModuleFilter,
    pub html: PathBuf,
    pub pdf: Option<PathBuf>,
}

/// Produces grade reports for the configured Notes document.
pub struct ReportGenerator<'a> {
    config: &'a PipelineConfig,
    options: ReportOptions,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self::with_options(config, ReportOptions::default())
    }

    pub fn with_options(config: &'a PipelineConfig, options: ReportOptions) -> Self {
        Self { config, options }
    }

    /// Write the HTML report for `module` and, when enabled, its PDF rendering.
    ///
    /// Both files are replaced atomically, so a failure never leaves a
    /// partial report behind.
    pub fn generate(&self, module: &ModuleFilter) -> Result<ReportArtifacts> {
        let span = info_span!("report", module = %module);
        let _guard = span.enter();
        let start = Instant::now();

        let mut transform = ReportTransform::load(&self.config.stylesheet)?;
        let params = self.params(module)?;
        let notes = self.config.xml_path(Dataset::Notes);
        let html = transform.apply(&notes, &params)?;

        let html_path = self.config.html_report_path(module.as_str());
        write_atomic(&html_path, html.as_bytes())?;
        tracing::info!(path = %html_path.display(), bytes = html.len(), "wrote HTML report");

        let pdf = if self.options.render_pdf {
            let bytes = render_pdf(&html, module.as_str())?;
            let pdf_path = self.config.pdf_report_path(module.as_str());
            write_atomic(&pdf_path, &bytes)?;
            tracing::info!(path = %pdf_path.display(), bytes = bytes.len(), "wrote PDF report");
            Some(pdf_path)
        } else {
            None
        };

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            "report complete"
        );
        Ok(ReportArtifacts {
            module: module.clone(),
            html: html_path,
            pdf,
        })
    }

    fn params(&self, module: &ModuleFilter) -> Result<ReportParams> {
        let mut params = ReportParams::new(module.clone());
        if self.options.include_students {
            // Absolute, so document() does not resolve it against the stylesheet.
            let students = self.config.xml_path(Dataset::Students);
            let absolute = std::path::absolute(&students).map_err(|source| ReportError::Read {
                path: students.clone(),
                source,
            })?;
            params.students_file = Some(absolute);
        }
        params.generated_on = Some(
            self.options
                .generated_on
                .clone()
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        );
        Ok(params)
    }
}
