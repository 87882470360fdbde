//! Per-format loading strategies.
//!
//! Each loader takes the target path plus the injected ports and returns a
//! [`RawConfig`] or a translated [`ConfigError`]. The asymmetry between the
//! JSON and YAML loaders is deliberate: JSON's `{}` parses straight to an
//! empty mapping, while YAML happily parses documents that contain no
//! mapping at all (empty file, bare `null`), and an absent mapping is never
//! a legitimate configuration.

use std::path::Path;

use serde_json::Value;

use super::dispatch::{resolve_format, ConfigFormat};
use super::error::{ConfigError, HINT_INVALID_CONFIG, HINT_NO_EXPORT, HINT_VALID_OBJECT};
use super::ports::{Ports, ScriptOutcome};
use super::RawConfig;

/// Load a single configuration file, routing by format.
///
/// Success always yields a mapping, possibly empty; failure is always a
/// typed error, never a silently absent value.
pub fn load_config_file(path: &Path, ports: &Ports) -> Result<RawConfig, ConfigError> {
    match resolve_format(path)? {
        ConfigFormat::Json => load_json(path, ports),
        ConfigFormat::Yaml => load_yaml(path, ports),
        ConfigFormat::Script => load_script(path, ports),
    }
}

fn load_json(path: &Path, ports: &Ports) -> Result<RawConfig, ConfigError> {
    let text = (ports.read_text)(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        hint: HINT_VALID_OBJECT,
        original: Some(Box::new(err)),
    })?;
    into_mapping(value, path)
}

fn load_yaml(path: &Path, ports: &Ports) -> Result<RawConfig, ConfigError> {
    let text = (ports.read_text)(path)?;

    // serde_yaml rejects fully empty input rather than yielding null.
    if text.trim().is_empty() {
        return Err(invalid_configuration(path));
    }

    let doc: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        hint: HINT_VALID_OBJECT,
        original: Some(Box::new(err)),
    })?;

    if yaml_is_falsy(&doc) {
        return Err(invalid_configuration(path));
    }

    // Re-keying through serde_json gives one RawConfig representation for
    // every format; YAML-only constructs like non-string keys fail here.
    let value = serde_json::to_value(&doc).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        hint: HINT_VALID_OBJECT,
        original: Some(Box::new(err)),
    })?;
    into_mapping(value, path)
}

fn load_script(path: &Path, ports: &Ports) -> Result<RawConfig, ConfigError> {
    match (ports.eval_script)(path)? {
        ScriptOutcome::NoExport => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            hint: HINT_NO_EXPORT,
            original: None,
        }),
        ScriptOutcome::Exported(value) => into_mapping(value, path),
    }
}

fn into_mapping(value: Value, path: &Path) -> Result<RawConfig, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            hint: HINT_VALID_OBJECT,
            original: None,
        }),
    }
}

fn invalid_configuration(path: &Path) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        hint: HINT_INVALID_CONFIG,
        original: None,
    }
}

/// A YAML document the original runtime would have treated as "no config":
/// empty document, `null`, `false`, `0`, `NaN`, or the empty string.
fn yaml_is_falsy(doc: &serde_yaml::Value) -> bool {
    match doc {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Bool(b) => !b,
        serde_yaml::Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0 || f.is_nan()),
        serde_yaml::Value::String(s) => s.is_empty(),
        _ => false,
    }
}
