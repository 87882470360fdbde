//! Extension-based dispatch from a config path to a loading strategy.
//!
//! Pure string inspection, no I/O. Extensions match case-insensitively; the
//! bare `rc` dotfile convention (`.tallyrc`, `.nycrc`) matches on the
//! filename itself since those files carry no extension at all.

use std::ffi::OsStr;
use std::path::Path;

use super::error::ConfigError;

/// Every file type a loader exists for, in the order loaders are tried.
pub const SUPPORTED_FILE_TYPES: &[&str] = &[".js", ".cjs", ".yml", ".yaml", ".json", "rc"];

const SCRIPT_EXTS: &[&str] = &["js", "cjs"];
const YAML_EXTS: &[&str] = &["yml", "yaml"];

/// The loading strategy a path routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Script,
}

/// Route a path to its loader by extension and filename convention.
pub fn resolve_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
    let file_name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    if SCRIPT_EXTS.contains(&ext.as_str()) {
        Ok(ConfigFormat::Script)
    } else if YAML_EXTS.contains(&ext.as_str()) {
        Ok(ConfigFormat::Yaml)
    } else if ext == "json" || file_name.ends_with("rc") {
        Ok(ConfigFormat::Json)
    } else {
        Err(ConfigError::UnsupportedFileType {
            path: path.to_path_buf(),
            extension: if ext.is_empty() { String::new() } else { format!(".{ext}") },
        })
    }
}
