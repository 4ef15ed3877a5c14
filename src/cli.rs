// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::AnalysisKind;

/// Command-line arguments for `mtsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mtsched",
    version,
    about = "Check whether a mixed-trust real-time workload is schedulable.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workload file (TOML).
    ///
    /// Default: `Workload.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Workload.toml")]
    pub workload: String,

    /// Test to run (base, exact, predictive, zsrm, modal).
    ///
    /// If omitted, `[analysis].kind` from the workload is used.
    #[arg(long, value_name = "KIND")]
    pub analysis: Option<AnalysisKind>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MTSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate and print the workload, but don't analyse it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
