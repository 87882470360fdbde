//! Configuration resolution engine.
//!
//! Resolves the tool's configuration from a file whose format is not known
//! in advance (JSON, YAML, or an executable `.js`/`.cjs` script module),
//! then reconciles it against the `extends` chain it declares and against
//! explicit command-line flags (CLI > child config > extended base config).
//!
//! Resolution is synchronous and runs once per invocation; every call
//! rebuilds the configuration from scratch and the caller owns the result.

pub mod discover;
pub mod dispatch;
pub mod error;
pub mod extends;
pub mod loaders;
pub mod merge;
pub mod ports;

/// An unvalidated, loader-produced configuration mapping. Key order follows
/// the source document; values are arbitrary JSON shapes. No schema is
/// enforced at this layer.
pub type RawConfig = serde_json::Map<String, serde_json::Value>;

pub use discover::{find_config_file, CONFIG_FILE_NAMES};
pub use dispatch::{resolve_format, ConfigFormat, SUPPORTED_FILE_TYPES};
pub use error::ConfigError;
pub use extends::resolve_config_file;
pub use loaders::load_config_file;
pub use merge::{merge_cli_with_config, CliOverrides, FinalConfig};
pub use ports::{Ports, ScriptError, ScriptOutcome};
