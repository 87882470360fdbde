//! Running the instrumented command.
//!
//! Report generation belongs to the coverage engine and is not handled here;
//! this only prepares the V8 coverage directory and forwards the child's
//! exit status.

use std::fs;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::config::FinalConfig;

pub fn run_instrumented(config: &FinalConfig, command: &[String]) -> Result<ExitCode> {
    let (program, args) = command.split_first().expect("caller checked for a command");

    if config.clean && fs::metadata(&config.temp_directory).is_ok() {
        fs::remove_dir_all(&config.temp_directory).with_context(|| {
            format!("failed to clean coverage directory {}", config.temp_directory)
        })?;
    }
    fs::create_dir_all(&config.temp_directory).with_context(|| {
        format!("failed to create coverage directory {}", config.temp_directory)
    })?;

    debug!("running {program} with V8 coverage written to {}", config.temp_directory);
    let status = Command::new(program)
        .args(args)
        .env("NODE_V8_COVERAGE", &config.temp_directory)
        .status()
        .with_context(|| format!("failed to launch {program}"))?;

    match status.code() {
        Some(code) => Ok(ExitCode::from(code.clamp(0, 255) as u8)),
        None => bail!("{program} was terminated by a signal"),
    }
}
