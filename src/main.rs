//! tally: resolve coverage configuration and run commands under V8
//! instrumentation.

use std::process::ExitCode;

fn main() -> ExitCode {
    match tally::cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
