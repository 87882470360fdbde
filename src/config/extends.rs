//! Resolution of `extends` chains.
//!
//! A config may name one or more parent configs, by path relative to its own
//! directory. Parents load through the same dispatch pipeline, parents'
//! parents first, and the chain merges base-to-specific with a shallow key
//! override: the requesting config always wins over anything it extends. A
//! path that shows up twice in its own ancestor chain fails fast instead of
//! recursing forever.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use super::error::ConfigError;
use super::loaders::load_config_file;
use super::ports::Ports;
use super::RawConfig;

const EXTENDS_KEY: &str = "extends";

const HINT_BAD_EXTENDS: &str = "the extends field must be a path or a list of paths.";

/// Load a configuration file and fully resolve its extends chain.
pub fn resolve_config_file(path: &Path, ports: &Ports) -> Result<RawConfig, ConfigError> {
    let config = load_config_file(path, ports)?;
    let mut chain = vec![normalize_path(path)];
    apply_extends(config, path, ports, &mut chain)
}

fn apply_extends(
    mut config: RawConfig,
    origin: &Path,
    ports: &Ports,
    chain: &mut Vec<PathBuf>,
) -> Result<RawConfig, ConfigError> {
    let Some(extends) = config.remove(EXTENDS_KEY) else {
        return Ok(config);
    };

    let parents = parent_paths(extends, origin)?;
    let base_dir = origin.parent().unwrap_or_else(|| Path::new("."));

    let mut merged = RawConfig::new();
    for parent in parents {
        let parent_path = base_dir.join(parent);
        let normalized = normalize_path(&parent_path);
        if chain.contains(&normalized) {
            return Err(ConfigError::CircularExtends { path: parent_path });
        }

        // Ancestors are resolved completely before this config's own keys
        // apply; a parent's failure is this config's failure.
        let depth = chain.len();
        chain.push(normalized);
        let parent_config = load_config_file(&parent_path, ports)?;
        let parent_resolved = apply_extends(parent_config, &parent_path, ports, chain)?;
        chain.truncate(depth);

        for (key, value) in parent_resolved {
            merged.insert(key, value);
        }
    }

    for (key, value) in config {
        merged.insert(key, value);
    }
    Ok(merged)
}

fn parent_paths(extends: Value, origin: &Path) -> Result<Vec<String>, ConfigError> {
    let bad_extends = || ConfigError::Parse {
        path: origin.to_path_buf(),
        hint: HINT_BAD_EXTENDS,
        original: None,
    };

    match extends {
        Value::String(path) => Ok(vec![path]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(path) => Ok(path),
                _ => Err(bad_extends()),
            })
            .collect(),
        _ => Err(bad_extends()),
    }
}

/// Lexical normalization, enough to recognize the same file reached through
/// `.` and `..` hops. Deliberately avoids `canonicalize`: the chain must be
/// comparable even when reads come from an injected, diskless port.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
