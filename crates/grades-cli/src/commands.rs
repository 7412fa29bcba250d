use std::io;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use grades_cli::selector::select_module;
use grades_model::{Dataset, ModuleCatalog, ModuleFilter, PipelineConfig, SchemaKind};
use grades_output::{convert_all, write_atomic};
use grades_report::{ReportGenerator, ReportOptions, load_catalog};
use grades_validate::{ValidationOutcome, validate_all};
use tracing::{info, info_span, warn};

use crate::cli::ReportArgs;
use crate::summary::{print_conversions, print_modules, print_report, print_validations};
use crate::types::ValidationReport;

/// Convert datasets to XML. Returns whether every dataset converted.
pub fn run_convert(config: &PipelineConfig, datasets: &[Dataset]) -> bool {
    let start = Instant::now();
    let conversions = convert_all(config, datasets);
    print_conversions(&conversions);
    let failed = conversions.iter().filter(|(_, result)| result.is_err()).count();
    info!(
        datasets = conversions.len(),
        failed,
        duration_ms = start.elapsed().as_millis(),
        "conversion stage complete"
    );
    failed == 0
}

/// Validate generated documents. Returns whether every document is valid.
pub fn run_validate(
    config: &PipelineConfig,
    datasets: &[Dataset],
    kinds: &[SchemaKind],
    report: Option<&Path>,
) -> Result<bool> {
    let outcomes = validate_all(config, datasets, kinds);
    print_validations(&outcomes);
    if let Some(path) = report {
        write_validation_report(&outcomes, path)?;
    }
    Ok(all_valid(&outcomes))
}

fn all_valid(outcomes: &[ValidationOutcome]) -> bool {
    outcomes
        .iter()
        .all(|outcome| matches!(&outcome.result, Ok(result) if result.valid))
}

fn write_validation_report(outcomes: &[ValidationOutcome], path: &Path) -> Result<()> {
    let report = ValidationReport::from_outcomes(outcomes);
    let mut json = serde_json::to_vec_pretty(&report).context("serialize validation report")?;
    json.push(b'\n');
    write_atomic(path, &json)
        .with_context(|| format!("write validation report {}", path.display()))?;
    info!(path = %path.display(), entries = report.entries.len(), "wrote validation report");
    Ok(())
}

pub fn run_modules(config: &PipelineConfig) -> Result<()> {
    let catalog = load_catalog(config).context("list modules")?;
    print_modules(&catalog);
    Ok(())
}

/// Generate one module report. An empty module catalog leaves nothing to
/// report on and is not a failure.
pub fn run_report(config: &PipelineConfig, args: &ReportArgs) -> Result<()> {
    let catalog = load_catalog(config).context("list modules")?;
    let Some(module) = resolve_module(&catalog, args)? else {
        warn!(
            path = %config.xml_path(Dataset::Modules).display(),
            "no modules found; no report generated"
        );
        println!("No modules found; no report generated.");
        return Ok(());
    };

    let options = ReportOptions {
        include_students: !args.no_students,
        render_pdf: !args.html_only,
        generated_on: None,
    };
    let artifacts = ReportGenerator::with_options(config, options)
        .generate(&module)
        .with_context(|| format!("generate report for '{module}'"))?;
    print_report(&artifacts);
    Ok(())
}

/// Module from `--module`, `--module-index` or the interactive menu.
fn resolve_module(catalog: &ModuleCatalog, args: &ReportArgs) -> Result<Option<ModuleFilter>> {
    if let Some(name) = &args.module {
        return catalog
            .filter_for(name)
            .map(Some)
            .ok_or_else(|| anyhow!("module '{name}' is not listed in the Modules document"));
    }
    if let Some(position) = args.module_index {
        if catalog.is_empty() {
            return Ok(None);
        }
        return catalog.select(position).map(Some).ok_or_else(|| {
            anyhow!(
                "module index {position} is out of range (1-{})",
                catalog.len()
            )
        });
    }
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    select_module(catalog, &mut input, &mut output).context("select module")
}

/// Convert, validate with both schema kinds, then report.
///
/// Invalid documents are reported but do not stop the report stage; a
/// failed conversion does.
pub fn run_pipeline(config: &PipelineConfig, args: &ReportArgs) -> Result<bool> {
    let span = info_span!("pipeline", data_dir = %config.data_dir.display());
    let _guard = span.enter();
    let start = Instant::now();

    if !run_convert(config, &Dataset::ALL) {
        return Err(anyhow!("conversion failed; skipping validation and report"));
    }
    let valid = run_validate(config, &Dataset::ALL, &SchemaKind::ALL, None)?;
    if !valid {
        warn!("continuing with invalid documents");
    }
    run_report(config, args)?;

    info!(
        duration_ms = start.elapsed().as_millis(),
        valid,
        "pipeline complete"
    );
    Ok(valid)
}
