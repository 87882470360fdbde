//! Command-line interface for tally.
//!
//! Owns the flag grammar and invokes the configuration resolution engine as
//! its config-loading step. Resolution failures bubble up as errors; turning
//! them into a non-zero exit happens in `main`, never inside the engine.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{
    find_config_file, merge_cli_with_config, resolve_config_file, CliOverrides, FinalConfig,
    Ports, RawConfig,
};

mod run;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintFormat {
    Text,
    Json,
}

/// Coverage front-end: resolve configuration, then run a command under V8
/// coverage instrumentation
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Coverage reporter(s) to use
    #[arg(short = 'r', long, value_name = "NAME")]
    reporter: Vec<String>,

    /// Directory where coverage reports will be written
    #[arg(short = 'o', long, visible_alias = "report-dir", value_name = "DIR")]
    reports_dir: Option<String>,

    /// Consider all source files in the project, covered or not
    #[arg(long)]
    all: bool,

    /// Alternate directories --all scans for source files (repeatable)
    #[arg(long, value_name = "DIR")]
    src: Vec<String>,

    /// Files that should be covered (glob patterns supported)
    #[arg(short = 'n', long, value_name = "GLOB")]
    include: Vec<String>,

    /// Files and directories excluded from coverage (glob patterns supported)
    #[arg(short = 'x', long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// File extensions considered for coverage
    #[arg(short = 'e', long, value_name = "EXT")]
    extension: Vec<String>,

    /// Apply exclude logic after files are remapped by a source map
    #[arg(short = 'a', long)]
    exclude_after_remap: bool,

    /// Exclude node_modules folders (on by default)
    #[arg(long, overrides_with = "no_exclude_node_modules")]
    exclude_node_modules: bool,
    #[arg(long, hide = true)]
    no_exclude_node_modules: bool,

    /// Do not show files with 100% coverage
    #[arg(long)]
    skip_full: bool,

    /// Fail when coverage drops below the configured thresholds
    #[arg(long)]
    check_coverage: bool,

    /// Percent of branches that must be covered
    #[arg(long, value_name = "PCT")]
    branches: Option<f64>,

    /// Percent of functions that must be covered
    #[arg(long, value_name = "PCT")]
    functions: Option<f64>,

    /// Percent of lines that must be covered
    #[arg(long, value_name = "PCT")]
    lines: Option<f64>,

    /// Percent of statements that must be covered
    #[arg(long, value_name = "PCT")]
    statements: Option<f64>,

    /// Check coverage thresholds per file
    #[arg(long)]
    per_file: bool,

    /// Shortcut for --check-coverage with every threshold at 100
    #[arg(id = "100", long = "100")]
    hundred: bool,

    /// Directory V8 coverage data is written to and read from
    #[arg(long, value_name = "DIR", env = "NODE_V8_COVERAGE")]
    temp_directory: Option<String>,

    /// Delete previous coverage data before running (on by default)
    #[arg(long, overrides_with = "no_clean")]
    clean: bool,
    #[arg(long, hide = true)]
    no_clean: bool,

    /// Omit paths that are not absolute (on by default)
    #[arg(long, overrides_with = "no_omit_relative")]
    omit_relative: bool,
    #[arg(long, hide = true)]
    no_omit_relative: bool,

    /// Allow files from outside the working directory
    #[arg(long)]
    allow_external: bool,

    /// Print the derived configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Format used by --print-config
    #[arg(long, value_enum, default_value = "text", value_name = "FORMAT")]
    print_config_format: PrintFormat,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,

    /// Command to run under coverage instrumentation
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            reporter: non_empty(&self.reporter),
            reports_dir: self.reports_dir.clone(),
            all: self.all.then_some(true),
            src: non_empty(&self.src),
            include: non_empty(&self.include),
            exclude: non_empty(&self.exclude),
            extension: non_empty(&self.extension),
            exclude_after_remap: self.exclude_after_remap.then_some(true),
            exclude_node_modules: flag_pair(self.exclude_node_modules, self.no_exclude_node_modules),
            skip_full: self.skip_full.then_some(true),
            check_coverage: self.check_coverage.then_some(true),
            branches: self.branches,
            functions: self.functions,
            lines: self.lines,
            statements: self.statements,
            per_file: self.per_file.then_some(true),
            hundred: self.hundred.then_some(true),
            temp_directory: self.temp_directory.clone(),
            clean: flag_pair(self.clean, self.no_clean),
            omit_relative: flag_pair(self.omit_relative, self.no_omit_relative),
            allow_external: self.allow_external.then_some(true),
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values.to_vec()) }
}

/// Collapse a --flag / --no-flag pair into an explicit tri-state.
fn flag_pair(positive: bool, negative: bool) -> Option<bool> {
    if negative {
        Some(false)
    } else if positive {
        Some(true)
    } else {
        None
    }
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let ports = Ports::default();
    let config_path = match cli.config.clone() {
        Some(path) => Some(path),
        None => {
            let cwd = std::env::current_dir().context("failed to determine working directory")?;
            find_config_file(&cwd)
        }
    };

    let resolved = match &config_path {
        Some(path) => {
            debug!("resolving configuration from {}", path.display());
            resolve_config_file(path, &ports)?
        }
        None => RawConfig::new(),
    };

    let merged = merge_cli_with_config(&resolved, &cli.overrides());

    if cli.print_config {
        print_config(&merged, cli.print_config_format)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.command.is_empty() {
        bail!("no command to run; pass a command to instrument, or use --print-config");
    }
    run::run_instrumented(&merged, &cli.command)
}

fn print_config(config: &FinalConfig, format: PrintFormat) -> Result<()> {
    match format {
        PrintFormat::Json => {
            let rendered = serde_json::to_string_pretty(config)
                .context("failed to serialize configuration")?;
            println!("{rendered}");
        }
        PrintFormat::Text => {
            let value =
                serde_json::to_value(config).context("failed to serialize configuration")?;
            let serde_json::Value::Object(object) = value else {
                bail!("derived configuration did not serialize to an object");
            };
            for (key, entry) in &object {
                println!("{key}: {entry}");
            }
        }
    }
    Ok(())
}
