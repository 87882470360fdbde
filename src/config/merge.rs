//! Final reconciliation of the resolved config with CLI flags.
//!
//! Precedence for every option: explicit CLI flag > resolved config value >
//! built-in default. Config keys are accepted in kebab-case or camelCase
//! since both conventions circulate in the dotfile ecosystem. Pure: no I/O,
//! no mutation of the inputs.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::RawConfig;

pub const DEFAULT_REPORTER: &str = "text";
pub const DEFAULT_REPORTS_DIR: &str = "./coverage";
pub const DEFAULT_LINES: f64 = 90.0;

/// Coverage extensions considered by default.
pub const DEFAULT_EXTENSION: &[&str] = &[".js", ".cjs", ".mjs", ".ts", ".tsx", ".jsx"];

/// Paths excluded from coverage by default.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "coverage/**",
    "packages/*/test{,s}/**",
    "test{,s}/**",
    "test{,-*}.{js,cjs,mjs,ts,tsx,jsx}",
    "**/*{.,-}test.{js,cjs,mjs,ts,tsx,jsx}",
    "**/__tests__/**",
    "**/{ansi-color,babel.config,jest.config,karma.conf,rollup.config,webpack.config}.js",
    "**/.{eslint,mocha}rc.{js,cjs}",
];

/// The fully reconciled configuration handed to the coverage engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FinalConfig {
    pub reporter: Vec<String>,
    pub reports_dir: String,
    pub all: bool,
    pub src: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub extension: Vec<String>,
    pub exclude_after_remap: bool,
    pub exclude_node_modules: bool,
    pub skip_full: bool,
    pub check_coverage: bool,
    pub branches: f64,
    pub functions: f64,
    pub lines: f64,
    pub statements: f64,
    pub per_file: bool,
    pub temp_directory: String,
    pub clean: bool,
    pub omit_relative: bool,
    pub allow_external: bool,
}

/// Options the user set explicitly on the command line. `None` means the
/// flag was absent and the resolved config (or the default) stands.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub reporter: Option<Vec<String>>,
    pub reports_dir: Option<String>,
    pub all: Option<bool>,
    pub src: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub extension: Option<Vec<String>>,
    pub exclude_after_remap: Option<bool>,
    pub exclude_node_modules: Option<bool>,
    pub skip_full: Option<bool>,
    pub check_coverage: Option<bool>,
    pub branches: Option<f64>,
    pub functions: Option<f64>,
    pub lines: Option<f64>,
    pub statements: Option<f64>,
    pub per_file: Option<bool>,
    pub hundred: Option<bool>,
    pub temp_directory: Option<String>,
    pub clean: Option<bool>,
    pub omit_relative: Option<bool>,
    pub allow_external: Option<bool>,
}

/// Reconcile the resolved configuration with the command line.
pub fn merge_cli_with_config(config: &RawConfig, cli: &CliOverrides) -> FinalConfig {
    // `100` forces every threshold to 100 and turns checking on; a
    // threshold flag given explicitly alongside it still wins.
    let hundred = cli.hundred.or_else(|| config_bool(config, "100")).unwrap_or(false);

    let threshold = |explicit: Option<f64>, key: &str, default: f64| -> f64 {
        if let Some(value) = explicit {
            value
        } else if hundred {
            100.0
        } else {
            config_number(config, key).unwrap_or(default)
        }
    };

    let reports_dir = cli
        .reports_dir
        .clone()
        .or_else(|| config_string(config, "reports-dir"))
        .or_else(|| config_string(config, "report-dir"))
        .unwrap_or_else(|| DEFAULT_REPORTS_DIR.to_string());

    let temp_directory = cli
        .temp_directory
        .clone()
        .or_else(|| config_string(config, "temp-directory"))
        .unwrap_or_else(|| Path::new(&reports_dir).join("tmp").display().to_string());

    FinalConfig {
        reporter: cli
            .reporter
            .clone()
            .or_else(|| config_string_list(config, "reporter"))
            .unwrap_or_else(|| vec![DEFAULT_REPORTER.to_string()]),
        all: pick_bool(cli.all, config, "all", false),
        src: cli
            .src
            .clone()
            .or_else(|| config_string_list(config, "src"))
            .unwrap_or_default(),
        include: cli
            .include
            .clone()
            .or_else(|| config_string_list(config, "include"))
            .unwrap_or_default(),
        exclude: cli
            .exclude
            .clone()
            .or_else(|| config_string_list(config, "exclude"))
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()),
        extension: cli
            .extension
            .clone()
            .or_else(|| config_string_list(config, "extension"))
            .unwrap_or_else(|| DEFAULT_EXTENSION.iter().map(|s| s.to_string()).collect()),
        exclude_after_remap: pick_bool(cli.exclude_after_remap, config, "exclude-after-remap", false),
        exclude_node_modules: pick_bool(cli.exclude_node_modules, config, "exclude-node-modules", true),
        skip_full: pick_bool(cli.skip_full, config, "skip-full", false),
        check_coverage: pick_bool(cli.check_coverage, config, "check-coverage", false) || hundred,
        branches: threshold(cli.branches, "branches", 0.0),
        functions: threshold(cli.functions, "functions", 0.0),
        lines: threshold(cli.lines, "lines", DEFAULT_LINES),
        statements: threshold(cli.statements, "statements", 0.0),
        per_file: pick_bool(cli.per_file, config, "per-file", false),
        temp_directory,
        clean: pick_bool(cli.clean, config, "clean", true),
        omit_relative: pick_bool(cli.omit_relative, config, "omit-relative", true),
        allow_external: pick_bool(cli.allow_external, config, "allow-external", false),
        reports_dir,
    }
}

fn pick_bool(explicit: Option<bool>, config: &RawConfig, key: &str, default: bool) -> bool {
    explicit.or_else(|| config_bool(config, key)).unwrap_or(default)
}

/// Look a key up in kebab-case, then camelCase.
fn lookup<'a>(config: &'a RawConfig, key: &str) -> Option<&'a Value> {
    config.get(key).or_else(|| config.get(&camel_case(key)))
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn config_bool(config: &RawConfig, key: &str) -> Option<bool> {
    match lookup(config, key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            warn!("ignoring non-boolean config value for {key}: {other}");
            None
        }
        None => None,
    }
}

fn config_number(config: &RawConfig, key: &str) -> Option<f64> {
    match lookup(config, key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => {
            warn!("ignoring non-numeric config value for {key}: {other}");
            None
        }
        None => None,
    }
}

fn config_string(config: &RawConfig, key: &str) -> Option<String> {
    match lookup(config, key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!("ignoring non-string config value for {key}: {other}");
            None
        }
        None => None,
    }
}

/// A list-valued option may be written as a single string or as a sequence.
fn config_string_list(config: &RawConfig, key: &str) -> Option<Vec<String>> {
    match lookup(config, key) {
        Some(Value::String(s)) => Some(vec![s.clone()]),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => {
                        warn!("ignoring non-string entry in config list {key}: {other}");
                        None
                    }
                })
                .collect(),
        ),
        Some(other) => {
            warn!("ignoring non-list config value for {key}: {other}");
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawConfig {
        serde_json::from_str(json).expect("valid json")
    }

    #[test]
    fn test_defaults_apply_when_nothing_is_set() {
        let merged = merge_cli_with_config(&RawConfig::new(), &CliOverrides::default());
        assert_eq!(merged.reporter, vec![DEFAULT_REPORTER.to_string()]);
        assert_eq!(merged.reports_dir, DEFAULT_REPORTS_DIR);
        assert_eq!(merged.lines, DEFAULT_LINES);
        assert_eq!(merged.branches, 0.0);
        assert!(merged.clean);
        assert!(merged.exclude_node_modules);
        assert!(!merged.check_coverage);
        assert_eq!(merged.exclude.len(), DEFAULT_EXCLUDE.len());
        assert_eq!(merged.extension.len(), DEFAULT_EXTENSION.len());
    }

    #[test]
    fn test_config_value_overrides_default() {
        let config = raw(r#"{"lines": 75, "reporter": ["lcov"], "clean": false}"#);
        let merged = merge_cli_with_config(&config, &CliOverrides::default());
        assert_eq!(merged.lines, 75.0);
        assert_eq!(merged.reporter, vec!["lcov".to_string()]);
        assert!(!merged.clean);
    }

    #[test]
    fn test_explicit_cli_flag_overrides_config() {
        let config = raw(r#"{"lines": 90}"#);
        let cli = CliOverrides { lines: Some(100.0), ..Default::default() };
        let merged = merge_cli_with_config(&config, &cli);
        assert_eq!(merged.lines, 100.0);
    }

    #[test]
    fn test_camel_case_config_keys_are_recognized() {
        let config = raw(r#"{"reportsDir": "./out", "checkCoverage": true, "skipFull": true}"#);
        let merged = merge_cli_with_config(&config, &CliOverrides::default());
        assert_eq!(merged.reports_dir, "./out");
        assert!(merged.check_coverage);
        assert!(merged.skip_full);
    }

    #[test]
    fn test_single_string_reporter_becomes_a_one_element_list() {
        let config = raw(r#"{"reporter": "html"}"#);
        let merged = merge_cli_with_config(&config, &CliOverrides::default());
        assert_eq!(merged.reporter, vec!["html".to_string()]);
    }

    #[test]
    fn test_temp_directory_defaults_under_reports_dir() {
        let merged = merge_cli_with_config(&RawConfig::new(), &CliOverrides::default());
        assert_eq!(
            merged.temp_directory,
            Path::new(DEFAULT_REPORTS_DIR).join("tmp").display().to_string()
        );

        let cli = CliOverrides { reports_dir: Some("./cov".to_string()), ..Default::default() };
        let merged = merge_cli_with_config(&RawConfig::new(), &cli);
        assert_eq!(merged.temp_directory, Path::new("./cov").join("tmp").display().to_string());
    }

    #[test]
    fn test_hundred_shortcut_raises_every_threshold_and_checks() {
        let config = raw(r#"{"lines": 40, "branches": 40}"#);
        let cli = CliOverrides { hundred: Some(true), ..Default::default() };
        let merged = merge_cli_with_config(&config, &cli);
        assert_eq!(merged.lines, 100.0);
        assert_eq!(merged.branches, 100.0);
        assert_eq!(merged.functions, 100.0);
        assert_eq!(merged.statements, 100.0);
        assert!(merged.check_coverage);
    }

    #[test]
    fn test_explicit_threshold_still_wins_over_hundred() {
        let cli = CliOverrides {
            hundred: Some(true),
            lines: Some(95.0),
            ..Default::default()
        };
        let merged = merge_cli_with_config(&RawConfig::new(), &cli);
        assert_eq!(merged.lines, 95.0);
        assert_eq!(merged.branches, 100.0);
    }

    #[test]
    fn test_mistyped_config_values_fall_back_to_defaults() {
        let config = raw(r#"{"lines": "ninety", "clean": "yes", "reporter": 7}"#);
        let merged = merge_cli_with_config(&config, &CliOverrides::default());
        assert_eq!(merged.lines, DEFAULT_LINES);
        assert!(merged.clean);
        assert_eq!(merged.reporter, vec![DEFAULT_REPORTER.to_string()]);
    }

    #[test]
    fn test_merge_does_not_mutate_the_resolved_config() {
        let config = raw(r#"{"lines": 80}"#);
        let before = config.clone();
        let _ = merge_cli_with_config(&config, &CliOverrides::default());
        assert_eq!(config, before);
    }
}
