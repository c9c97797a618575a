use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the semac binary.
#[derive(Parser, Debug)]
#[command(
    name = "semac",
    version,
    about = "Complete every symbol of a source unit and report its diagnostics"
)]
pub struct CliArgs {
    /// Path to the unit manifest (JSON).
    pub manifest: PathBuf,

    /// Output format for diagnostics.
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Number of worker threads used to complete types in parallel.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Disable colored output.
    #[arg(long = "no-color", alias = "noColor")]
    pub no_color: bool,

    /// Only complete and report declarations located in this file.
    #[arg(long)]
    pub file: Option<String>,

    /// Report warnings as errors.
    #[arg(long = "warnings-as-errors", alias = "warningsAsErrors")]
    pub warnings_as_errors: bool,

    /// Report private fields that are never read or never written.
    #[arg(long = "report-unused-fields", alias = "reportUnusedFields")]
    pub report_unused_fields: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
