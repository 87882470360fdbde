//! Injected I/O ports for the resolution engine.
//!
//! The loaders never touch the file system or the module system directly;
//! they go through a [`Ports`] value. Production code uses the defaults
//! below, tests swap in closures that simulate success, malformed content,
//! or thrown errors without touching disk.

use std::io;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// What executing a configuration script produced.
///
/// The distinction between "exported an empty object" and "never assigned an
/// export" is decided here, by the port, so callers get an explicit tri-state
/// instead of inferring it from the value afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    /// The script ran and assigned an export (possibly an empty one).
    Exported(Value),
    /// The script ran to completion without assigning any export.
    NoExport,
}

/// A failure of the configuration script itself: a thrown exception, a
/// compile error, or a missing script runtime. Never re-wrapped by the
/// engine; the script author's own defect should surface as-is.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScriptError {
    pub message: String,
}

pub type ReadTextFn = dyn Fn(&Path) -> io::Result<String>;
pub type EvalScriptFn = dyn Fn(&Path) -> Result<ScriptOutcome, ScriptError>;

/// Dependency-injection seam for the two effects resolution performs.
pub struct Ports {
    /// Read a file to text. I/O errors propagate to the caller unmodified.
    pub read_text: Box<ReadTextFn>,
    /// Execute a script module and report what it exported.
    pub eval_script: Box<EvalScriptFn>,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            read_text: Box::new(|path| std::fs::read_to_string(path)),
            eval_script: Box::new(eval_with_node),
        }
    }
}

/// Loader shim run inside a Node child process.
///
/// It wraps the `.js`/`.cjs` extension handlers so every freshly loaded
/// module starts out with a marker key on its default exports object; a
/// script that assigns `module.exports` replaces that object and drops the
/// marker, while one that assigns nothing keeps it. The handler swap mutates
/// state global to the Node process, so the previous handlers are restored
/// in a `finally` on every exit path. Confining the swap to a short-lived
/// child keeps this process (and any concurrent load in it) untouched.
const NODE_LOADER_SHIM: &str = r#"
const Module = require('module');
const { resolve } = require('path');
const NO_EXPORT = Symbol('tally.no-export');
const exts = Module._extensions;
const jsLoader = exts['.js'];
const cjsLoader = exts['.cjs'];
exts['.js'] = exts['.cjs'] = (mod, filename) => {
  mod.exports[NO_EXPORT] = filename;
  jsLoader(mod, filename);
};
let config;
try {
  config = require(resolve(process.argv[1]));
} finally {
  exts['.js'] = jsLoader;
  exts['.cjs'] = cjsLoader;
}
const none = typeof config === 'object' && config !== null && NO_EXPORT in config;
process.stdout.write('\n' + JSON.stringify(none ? { exported: false } : { exported: true, config }) + '\n');
"#;

#[derive(Deserialize)]
struct ShimEnvelope {
    exported: bool,
    #[serde(default)]
    config: Option<Value>,
}

/// Production script port: evaluate a `.js`/`.cjs` config module with Node.
pub fn eval_with_node(path: &Path) -> Result<ScriptOutcome, ScriptError> {
    debug!("evaluating configuration script {}", path.display());

    let output = Command::new("node")
        .arg("-e")
        .arg(NODE_LOADER_SHIM)
        .arg(path)
        .output()
        .map_err(|err| ScriptError {
            message: format!(
                "failed to launch node for configuration script {}: {err}",
                path.display()
            ),
        })?;

    if !output.status.success() {
        // The script threw (or failed to compile); its own stack trace is
        // the most useful thing we can show.
        return Err(ScriptError {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    // The script may have written its own stdout; the envelope is the last
    // non-empty line.
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let envelope = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| serde_json::from_str::<ShimEnvelope>(line).ok())
        .ok_or_else(|| ScriptError {
            message: format!(
                "configuration script {} did not produce a readable result",
                path.display()
            ),
        })?;

    if envelope.exported {
        Ok(ScriptOutcome::Exported(envelope.config.unwrap_or(Value::Null)))
    } else {
        Ok(ScriptOutcome::NoExport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_read_text_reads_from_disk() {
        let dir = tempfile::TempDir::new().expect("tmp");
        let path = dir.path().join(".tallyrc.json");
        std::fs::write(&path, "{\"lines\": 80}").expect("write");

        let ports = Ports::default();
        let text = (ports.read_text)(&path).expect("read");
        assert_eq!(text, "{\"lines\": 80}");
    }

    #[test]
    fn test_default_read_text_surfaces_missing_file_as_io_error() {
        let ports = Ports::default();
        let err = (ports.read_text)(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_shim_restores_loader_hooks_on_every_exit_path() {
        // The swap-and-restore lives in JS; the finally block is the one
        // guarantee keeping a throwing config from corrupting later loads.
        let after_restore = NODE_LOADER_SHIM.split("finally").nth(1).expect("finally block");
        assert!(after_restore.contains("exts['.js'] = jsLoader"));
        assert!(after_restore.contains("exts['.cjs'] = cjsLoader"));
    }

    // The tests below exercise the real Node engine. They skip (pass
    // vacuously) on machines without a node binary.
    fn node_available() -> bool {
        Command::new("node")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn write_script(dir: &tempfile::TempDir, name: &str, source: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, source).expect("write script");
        path
    }

    #[test]
    fn test_node_engine_reports_an_assigned_export() {
        if !node_available() {
            eprintln!("skipping: node not installed");
            return;
        }
        let dir = tempfile::TempDir::new().expect("tmp");
        let script = write_script(&dir, "tally.config.js", "module.exports = { lines: 85 };\n");

        let outcome = eval_with_node(&script).expect("eval");
        match outcome {
            ScriptOutcome::Exported(value) => {
                assert_eq!(value.get("lines"), Some(&Value::from(85)));
            }
            other => panic!("expected an export, got {other:?}"),
        }
    }

    #[test]
    fn test_node_engine_reports_an_explicitly_empty_export() {
        if !node_available() {
            eprintln!("skipping: node not installed");
            return;
        }
        let dir = tempfile::TempDir::new().expect("tmp");
        let script = write_script(&dir, "tally.config.cjs", "module.exports = {};\n");

        let outcome = eval_with_node(&script).expect("eval");
        assert_eq!(outcome, ScriptOutcome::Exported(Value::Object(Default::default())));
    }

    #[test]
    fn test_node_engine_distinguishes_a_script_that_exports_nothing() {
        if !node_available() {
            eprintln!("skipping: node not installed");
            return;
        }
        let dir = tempfile::TempDir::new().expect("tmp");
        let script = write_script(&dir, "tally.config.js", "const lines = 85;\n");

        let outcome = eval_with_node(&script).expect("eval");
        assert_eq!(outcome, ScriptOutcome::NoExport);
    }

    #[test]
    fn test_node_engine_surfaces_a_throwing_script_and_recovers() {
        if !node_available() {
            eprintln!("skipping: node not installed");
            return;
        }
        let dir = tempfile::TempDir::new().expect("tmp");
        let throwing =
            write_script(&dir, "bad.config.js", "throw new Error('config exploded');\n");
        let good = write_script(&dir, "tally.config.js", "module.exports = { all: true };\n");

        let err = eval_with_node(&throwing).unwrap_err();
        assert!(err.message.contains("config exploded"), "got: {}", err.message);

        // The throw must not poison later loads: the hook swap is restored
        // before the child exits, and each load gets a fresh child anyway.
        let outcome = eval_with_node(&good).expect("eval after throw");
        match outcome {
            ScriptOutcome::Exported(value) => {
                assert_eq!(value.get("all"), Some(&Value::Bool(true)));
            }
            other => panic!("expected an export, got {other:?}"),
        }
    }

    #[test]
    fn test_node_engine_ignores_a_scripts_own_stdout_noise() {
        if !node_available() {
            eprintln!("skipping: node not installed");
            return;
        }
        let dir = tempfile::TempDir::new().expect("tmp");
        let script = write_script(
            &dir,
            "tally.config.js",
            "console.log('loading config');\nmodule.exports = { lines: 60 };\n",
        );

        let outcome = eval_with_node(&script).expect("eval");
        match outcome {
            ScriptOutcome::Exported(value) => {
                assert_eq!(value.get("lines"), Some(&Value::from(60)));
            }
            other => panic!("expected an export, got {other:?}"),
        }
    }
}
