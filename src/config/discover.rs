//! Upward search for a configuration dotfile.
//!
//! When no `--config` path is given, the first matching name from
//! [`CONFIG_FILE_NAMES`] wins, searching the start directory and then each
//! ancestor. Membership in this list only matters for the search phase;
//! dispatch is driven purely by extension and filename convention, so an
//! explicitly supplied file with any recognized shape still loads.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Recognized bare config filenames: the tool's own family plus the legacy
/// `nyc` family it stays compatible with, in every supported extension.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".tallyrc",
    ".tallyrc.json",
    ".tallyrc.yml",
    ".tallyrc.yaml",
    ".tallyrc.js",
    ".tallyrc.cjs",
    ".tally.config.js",
    ".tally.config.cjs",
    "tally.config.js",
    "tally.config.cjs",
    ".nycrc",
    ".nycrc.json",
    ".nycrc.yml",
    ".nycrc.yaml",
    ".nyc.config.js",
    ".nyc.config.cjs",
    "nyc.config.js",
    "nyc.config.cjs",
];

/// Find the nearest configuration file at or above `start_dir`.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!("using configuration file {}", candidate.display());
                return Some(candidate);
            }
        }
    }
    None
}
