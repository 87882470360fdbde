//! Typed errors for configuration resolution.
//!
//! The parsing engines underneath (serde_json, serde_yaml, a Node subprocess)
//! produce errors that are opaque on their own, so the two translated kinds
//! keep a user-facing hint *and* the original diagnostic. I/O errors and
//! failures of the configuration script itself are deliberately not
//! translated: wrapping them would hide their true origin.

use std::path::PathBuf;

use thiserror::Error;

use super::dispatch::SUPPORTED_FILE_TYPES;
use super::ports::ScriptError;

/// The underlying parser diagnostic preserved inside a [`ConfigError::Parse`].
pub type OriginalError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The path matched no loader. Carries the attempted extension and the
    /// message lists every supported type so the user can fix the filename.
    #[error(
        "Unsupported file type \"{extension}\" while reading file {}. Please use one of the following file types: {}",
        .path.display(),
        SUPPORTED_FILE_TYPES.join(", ")
    )]
    UnsupportedFileType { path: PathBuf, extension: String },

    /// A loader matched but could not produce a configuration object.
    #[error(
        "Error loading configuration from file {}: {hint}{}",
        .path.display(),
        original_suffix(.original)
    )]
    Parse {
        path: PathBuf,
        hint: &'static str,
        original: Option<OriginalError>,
    },

    /// A file appeared twice in its own extends chain.
    #[error("Circular extended configurations: {} is already part of the extends chain", .path.display())]
    CircularExtends { path: PathBuf },

    /// Read failure from the text-read port, passed through unmodified.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The configuration script itself failed, passed through unmodified.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

fn original_suffix(original: &Option<OriginalError>) -> String {
    match original {
        Some(err) => format!(" Original error: {err}"),
        None => String::new(),
    }
}

/// Hint for content that parsed but is not a configuration mapping, or did
/// not parse at all.
pub(crate) const HINT_VALID_OBJECT: &str = "must contain a valid tally configuration object.";

/// Hint for a YAML document with no mapping in it (empty, `null`, `false`).
pub(crate) const HINT_INVALID_CONFIG: &str = "invalid configuration";

/// Hint for a script that ran to completion without assigning an export.
pub(crate) const HINT_NO_EXPORT: &str = "does not export a tally configuration object.";
