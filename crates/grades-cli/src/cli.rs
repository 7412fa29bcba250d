//! CLI argument definitions for the gradebook pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use grades_model::{Dataset, SchemaKind};

#[derive(Parser)]
#[command(
    name = "gradebook",
    version,
    about = "Gradebook pipeline - spreadsheets to validated XML and grade reports",
    long_about = "Convert student, module and grade spreadsheets to XML documents.\n\n\
                  Validates the documents against DTD or XSD schemas and renders\n\
                  per-module grade reports as HTML and PDF through XSLT."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Data directory (default: $GRADEBOOK_DATA_DIR, then ./data).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (default: <DATA_DIR>/gradebook.toml when present).
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert the source spreadsheets to XML documents.
    Convert(ConvertArgs),

    /// Validate the generated XML documents against their schemas.
    Validate(ValidateArgs),

    /// List the modules found in the Modules document.
    Modules,

    /// Generate the grade report of one module.
    Report(ReportArgs),

    /// Convert, validate with both schema kinds, then report.
    Run(ReportArgs),
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Dataset to convert (repeatable; default: all).
    #[arg(long = "dataset", value_enum)]
    pub datasets: Vec<DatasetArg>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Schema language to validate with (repeatable; default: dtd and xsd).
    #[arg(long = "kind", value_enum)]
    pub kinds: Vec<SchemaKindArg>,

    /// Dataset to validate (repeatable; default: all).
    #[arg(long = "dataset", value_enum)]
    pub datasets: Vec<DatasetArg>,

    /// Write every validation result as JSON to this file.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Module name to report on (must appear in the Modules document).
    #[arg(long = "module", value_name = "NAME", conflicts_with = "module_index")]
    pub module: Option<String>,

    /// 1-based position of the module in the `modules` listing.
    #[arg(long = "module-index", value_name = "N")]
    pub module_index: Option<usize>,

    /// Write the HTML report only.
    #[arg(long = "html-only")]
    pub html_only: bool,

    /// Do not look up student names in the Students document.
    #[arg(long = "no-students")]
    pub no_students: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DatasetArg {
    Students,
    Modules,
    Notes,
}

impl From<DatasetArg> for Dataset {
    fn from(value: DatasetArg) -> Self {
        match value {
            DatasetArg::Students => Dataset::Students,
            DatasetArg::Modules => Dataset::Modules,
            DatasetArg::Notes => Dataset::Notes,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaKindArg {
    Dtd,
    Xsd,
}

impl From<SchemaKindArg> for SchemaKind {
    fn from(value: SchemaKindArg) -> Self {
        match value {
            SchemaKindArg::Dtd => SchemaKind::Dtd,
            SchemaKindArg::Xsd => SchemaKind::Xsd,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Selected datasets in pipeline order, all of them when none is given.
pub fn datasets_or_all(args: &[DatasetArg]) -> Vec<Dataset> {
    if args.is_empty() {
        return Dataset::ALL.to_vec();
    }
    let mut datasets: Vec<Dataset> = args.iter().map(|&arg| arg.into()).collect();
    datasets.sort();
    datasets.dedup();
    datasets
}

/// Selected schema kinds, both when none is given.
pub fn kinds_or_all(args: &[SchemaKindArg]) -> Vec<SchemaKind> {
    if args.is_empty() {
        return SchemaKind::ALL.to_vec();
    }
    let mut kinds: Vec<SchemaKind> = Vec::new();
    for &arg in args {
        let kind = SchemaKind::from(arg);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}
