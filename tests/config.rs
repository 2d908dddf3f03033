//! Configuration Integration Tests
//!
//! Tests for loading, override application and path resolution.

use std::fs;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use serde_json::Value;
use sunshine::config::{self, apply_overrides, coerce_override_value, parse_document};
use sunshine::PipelineError;
use tempfile::TempDir;

const APP_CONFIG: &str = r#"
input_path: data/input
output_path: data/output
coefficient_term_expansion: 2
standard_temperature: 15
execution_order:
  - water_ingress
  - summary
load_all_files: false
storage_type: local

water_ingress:
  input_files:
    - atg_result.csv
    - pre_result.csv
  threshold: 0.5
"#;

fn project_with_config(content: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("app-config.yaml"), content).unwrap();
    temp
}

fn overrides(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_load_from_conventional_path() {
    let project = project_with_config(APP_CONFIG);

    let config = config::load(None, None, &[], project.path()).unwrap();

    assert_eq!(config.general.input_path, project.path().join("data/input"));
    assert_eq!(config.general.output_path, project.path().join("data/output"));
    assert_eq!(config.general.execution_path, PathBuf::new());
    assert_eq!(config.general.execution_order, vec!["water_ingress", "summary"]);
    assert_eq!(config.module_config("water_ingress")["threshold"], 0.5);
    assert!(config.module_config("summary").is_empty());
}

#[test]
fn test_load_explicit_path() {
    let project = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let config_path = elsewhere.path().join("staging.yaml");
    fs::write(&config_path, "execution_order: [a]\nstorage_type: s3\n").unwrap();

    let config = config::load(None, Some(config_path.as_path()), &[], project.path()).unwrap();

    assert_eq!(config.storage_type, "s3");
    assert_eq!(config.general.execution_order, vec!["a"]);
}

#[test]
fn test_missing_config_file() {
    let project = TempDir::new().unwrap();

    let result = config::load(None, None, &[], project.path());

    match result {
        Err(PipelineError::ConfigNotFound { path }) => {
            assert_eq!(path, project.path().join("app-config.yaml"));
        }
        other => panic!("Expected ConfigNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_malformed_config_file() {
    let project = project_with_config("execution_order: [a, b\n");

    let result = config::load(None, None, &[], project.path());
    assert!(matches!(result, Err(PipelineError::ConfigParse { .. })));
}

#[test]
fn test_wrong_type_is_parse_error() {
    let project = project_with_config("load_all_files: maybe\n");

    let result = config::load(None, None, &[], project.path());
    assert!(matches!(result, Err(PipelineError::ConfigParse { .. })));
}

#[test]
fn test_overrides_apply_before_parsing() {
    let project = project_with_config(APP_CONFIG);

    let config = config::load(
        None,
        None,
        &overrides(&["standard_temperature=20", "output_path=results", "storage_type=s3"]),
        project.path(),
    )
    .unwrap();

    assert_eq!(config.general.standard_temperature, 20);
    assert_eq!(config.general.output_path, project.path().join("results"));
    assert_eq!(config.storage_type, "s3");
}

#[test]
fn test_override_introduces_new_keys() {
    let document = parse_document("execution_order: []", Path::new("app-config.yaml")).unwrap();

    let document = apply_overrides(document, &overrides(&["x=10", "y=3.5", "z=abc"])).unwrap();

    assert_eq!(document["x"], Value::from(10));
    assert!(document["x"].is_i64());
    assert_eq!(document["y"], Value::from(3.5));
    assert_eq!(document["z"], Value::from("abc"));
}

#[test]
fn test_invalid_override_fails_startup() {
    let project = project_with_config(APP_CONFIG);

    let result = config::load(None, None, &overrides(&["x"]), project.path());
    assert!(matches!(result, Err(PipelineError::InvalidOverride { .. })));

    let result = config::load(None, None, &overrides(&["=1"]), project.path());
    assert!(matches!(result, Err(PipelineError::InvalidOverride { .. })));
}

#[test]
fn test_override_with_wrong_type_is_parse_error() {
    let project = project_with_config(APP_CONFIG);

    let result = config::load(None, None, &overrides(&["load_all_files=yes"]), project.path());
    assert!(matches!(result, Err(PipelineError::ConfigParse { .. })));
}

#[test]
fn test_overrides_toggle_boolean_flags() {
    let project = project_with_config(APP_CONFIG);

    let config = config::load(
        None,
        None,
        &overrides(&["delete_execution_data=true", "load_all_files=TRUE"]),
        project.path(),
    )
    .unwrap();
    assert!(config.general.delete_execution_data);
    assert!(config.general.load_all_files);

    let config = config::load(None, None, &overrides(&["load_all_files=false"]), project.path()).unwrap();
    assert!(!config.general.load_all_files);
}

#[test]
fn test_module_hint_collects_section() {
    let project = project_with_config("execution_order: []\nreport:\n  format: csv\n");

    let config = config::load(Some("report"), None, &[], project.path()).unwrap();

    assert_eq!(config.module_config("report")["format"], "csv");
}

proptest! {
    /// All-digit values become integers
    #[test]
    fn digits_coerce_to_integer(value in "[0-9]{1,18}") {
        let coerced = coerce_override_value(&value);
        prop_assert!(coerced.is_i64());
        prop_assert_eq!(coerced.as_i64().unwrap(), value.parse::<i64>().unwrap());
    }

    /// Digits with a single decimal point become floats
    #[test]
    fn decimals_coerce_to_float(value in "[0-9]{1,6}\\.[0-9]{1,6}") {
        let coerced = coerce_override_value(&value);
        prop_assert!(coerced.is_f64());
    }

    /// Anything with a letter stays a string
    #[test]
    fn words_stay_strings(value in "[a-z][a-z0-9._-]{0,12}") {
        prop_assert_eq!(coerce_override_value(&value), Value::String(value.clone()));
    }
}
