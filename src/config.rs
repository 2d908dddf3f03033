//! Runtime configuration for a pipeline run.
//!
//! Loading happens in three stages:
//! 1. Read the YAML document into a raw mapping
//! 2. Apply `key=value` overrides to the raw mapping
//! 3. Parse the general settings and collect per-module sections
//!
//! Overrides land before structured parsing, so they can introduce or
//! replace any top-level key, including the paths resolved in stage 3.
//! Relative paths are resolved against the project root (see [`paths`]).

pub mod paths;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::error::{PipelineError, Result};

/// Raw configuration document (top-level mapping)
pub type Document = Map<String, Value>;

/// Configuration slice handed to a single module
pub type ModuleConfig = Map<String, Value>;

/// General settings (the structured part of the document)
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    input_path: Option<String>,
    output_path: Option<String>,
    execution_path: Option<String>,
    #[serde(default)]
    coefficient_term_expansion: i64,
    #[serde(default)]
    standard_temperature: i64,
    #[serde(default)]
    execution_order: Vec<String>,
    #[serde(default = "default_load_all_files", deserialize_with = "deserialize_flag")]
    load_all_files: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    delete_execution_data: bool,
    #[serde(default = "default_storage_type")]
    storage_type: String,
}

fn default_load_all_files() -> bool {
    true
}
fn default_storage_type() -> String {
    "local".to_string()
}

/// Accept a boolean or the strings `true`/`false`, so `key=true` overrides
/// (which arrive as strings) can toggle flags.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => Ok(flag),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(de::Error::invalid_value(
                Unexpected::Str(&text),
                &"a boolean or \"true\"/\"false\"",
            )),
        },
    }
}

/// Resolved general settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralConfig {
    /// Global input tree (empty path when not configured)
    pub input_path: PathBuf,
    /// Global output location (empty path when not configured)
    pub output_path: PathBuf,
    /// Base directory for execution trees (empty path when not configured)
    pub execution_path: PathBuf,
    pub coefficient_term_expansion: i64,
    pub standard_temperature: i64,
    /// Modules to run, in order
    pub execution_order: Vec<String>,
    /// Mirror the whole input tree into each module instead of `input_files`
    pub load_all_files: bool,
    /// Purge the run directory once the run has finished
    pub delete_execution_data: bool,
}

/// Immutable configuration for one run
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub general: GeneralConfig,
    /// Module name -> module section (empty when the document has none)
    pub modules: BTreeMap<String, ModuleConfig>,
    pub storage_type: String,
}

impl RuntimeConfig {
    /// A module's section; never fails, absent sections are empty
    pub fn module_config(&self, name: &str) -> ModuleConfig {
        self.modules.get(name).cloned().unwrap_or_default()
    }
}

/// Load the runtime configuration.
///
/// `config_file` falls back to `<project_root>/app-config.yaml`.
pub fn load(
    module_hint: Option<&str>,
    config_file: Option<&Path>,
    overrides: &[String],
    project_root: &Path,
) -> Result<RuntimeConfig> {
    info!("Starting configuration load");
    let config_path = config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::default_config_path(project_root));

    let document = read_document(&config_path)?;
    let document = apply_overrides(document, overrides)?;
    let config = resolve(&document, project_root, module_hint, &config_path)?;

    info!(
        storage_type = %config.storage_type,
        module = module_hint.unwrap_or("None"),
        "Configuration loaded"
    );
    Ok(config)
}

/// Read and parse the configuration document at `path`.
pub fn read_document(path: &Path) -> Result<Document> {
    info!(path = %path.display(), "Reading configuration");
    if !path.exists() {
        error!(path = %path.display(), "Configuration file not found");
        return Err(PipelineError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::io("read configuration", path, e))?;
    parse_document(&content, path)
}

/// Parse document text. `path` is only used for error reporting.
pub fn parse_document(content: &str, path: &Path) -> Result<Document> {
    let parse_error = |message: String| {
        error!(path = %path.display(), %message, "Configuration parsing error");
        PipelineError::ConfigParse {
            path: path.to_path_buf(),
            message,
        }
    };

    let value: Value = serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
    match value {
        Value::Object(document) => Ok(document),
        Value::Null => Ok(Document::new()),
        _ => Err(parse_error("top level must be a mapping".to_string())),
    }
}

/// Apply `key=value` overrides to the top level of `document`.
pub fn apply_overrides(mut document: Document, overrides: &[String]) -> Result<Document> {
    if !overrides.is_empty() {
        info!(count = overrides.len(), "Applying runtime overrides");
    }

    for raw in overrides {
        let (key, value) = parse_override(raw)?;
        info!(%key, %value, "Applying override");
        document.insert(key, value);
    }
    Ok(document)
}

/// Split an override at its first `=` and coerce the value.
pub fn parse_override(raw: &str) -> Result<(String, Value)> {
    let invalid = |reason: &str| {
        error!(raw, reason, "Invalid override format");
        PipelineError::InvalidOverride {
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    };

    let (key, value) = raw.split_once('=').ok_or_else(|| invalid("expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid("key must not be empty"));
    }

    Ok((key.to_string(), coerce_override_value(value)))
}

/// Integer if all digits, float if digits with one decimal point,
/// string otherwise.
pub fn coerce_override_value(value: &str) -> Value {
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if is_digits(value) {
        if let Ok(int) = value.parse::<i64>() {
            return Value::from(int);
        }
        // Too wide for i64
        if let Ok(float) = value.parse::<f64>() {
            return Value::from(float);
        }
    } else if value.matches('.').count() == 1 && is_digits(&value.replacen('.', "", 1)) {
        if let Ok(float) = value.parse::<f64>() {
            return Value::from(float);
        }
    }

    Value::String(value.to_string())
}

/// Build the runtime configuration from a (possibly overridden) document.
pub fn resolve(
    document: &Document,
    project_root: &Path,
    module_hint: Option<&str>,
    config_path: &Path,
) -> Result<RuntimeConfig> {
    let parse_error = |message: String| PipelineError::ConfigParse {
        path: config_path.to_path_buf(),
        message,
    };

    let file: ConfigFile = serde_json::from_value(Value::Object(document.clone()))
        .map_err(|e| parse_error(e.to_string()))?;

    let general = GeneralConfig {
        input_path: resolve_path(project_root, file.input_path.as_deref()),
        output_path: resolve_path(project_root, file.output_path.as_deref()),
        execution_path: resolve_path(project_root, file.execution_path.as_deref()),
        coefficient_term_expansion: file.coefficient_term_expansion,
        standard_temperature: file.standard_temperature,
        execution_order: file.execution_order,
        load_all_files: file.load_all_files,
        delete_execution_data: file.delete_execution_data,
    };
    debug!(execution_order = ?general.execution_order, "Parsed general configuration");

    let mut modules = BTreeMap::new();
    let names = general.execution_order.iter().map(String::as_str).chain(module_hint);
    for name in names {
        let section = match document.get(name) {
            None => ModuleConfig::new(),
            Some(Value::Object(section)) => section.clone(),
            Some(_) => {
                return Err(parse_error(format!(
                    "section for module '{}' must be a mapping",
                    name
                )))
            }
        };
        modules.insert(name.to_string(), section);
    }

    Ok(RuntimeConfig {
        general,
        modules,
        storage_type: file.storage_type,
    })
}

/// Resolve a configured path against the project root.
///
/// A missing or empty value yields the empty path, not an error.
fn resolve_path(project_root: &Path, path_str: Option<&str>) -> PathBuf {
    let Some(path_str) = path_str.filter(|p| !p.is_empty()) else {
        return PathBuf::new();
    };

    let joined = project_root.join(path_str);
    joined.canonicalize().unwrap_or(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG_YAML: &str = r#"
input_path: data/input
coefficient_term_expansion: 3
standard_temperature: 15
execution_order: [water_ingress, summary]
load_all_files: false

water_ingress:
  input_files: [atg_result.csv, pre_result.csv]
"#;

    fn resolve_str(content: &str) -> Result<RuntimeConfig> {
        let path = Path::new("app-config.yaml");
        let document = parse_document(content, path)?;
        resolve(&document, Path::new("/srv/project"), None, path)
    }

    #[test]
    fn test_config_parsing_with_defaults() {
        let config = resolve_str(TEST_CONFIG_YAML).unwrap();

        assert_eq!(config.general.input_path, PathBuf::from("/srv/project/data/input"));
        assert_eq!(config.general.coefficient_term_expansion, 3);
        assert_eq!(config.general.standard_temperature, 15);
        assert_eq!(config.general.execution_order, vec!["water_ingress", "summary"]);
        assert!(!config.general.load_all_files);
        assert!(!config.general.delete_execution_data);
        assert_eq!(config.storage_type, "local");
    }

    #[test]
    fn test_missing_paths_are_empty() {
        let config = resolve_str("execution_order: []").unwrap();

        assert_eq!(config.general.output_path, PathBuf::new());
        assert_eq!(config.general.execution_path, PathBuf::new());
        assert!(config.general.load_all_files);
    }

    #[test]
    fn test_module_sections() {
        let config = resolve_str(TEST_CONFIG_YAML).unwrap();

        let ingress = config.module_config("water_ingress");
        assert_eq!(ingress["input_files"][0], "atg_result.csv");
        assert!(config.module_config("summary").is_empty());
        assert!(config.modules.contains_key("summary"));
    }

    #[test]
    fn test_non_mapping_module_section_is_rejected() {
        let result = resolve_str("execution_order: [a]\na: 5\n");
        assert!(matches!(result, Err(PipelineError::ConfigParse { .. })));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = resolve_str("").unwrap();
        assert!(config.general.execution_order.is_empty());
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_override_coercion() {
        assert_eq!(coerce_override_value("10"), Value::from(10));
        assert_eq!(coerce_override_value("3.5"), Value::from(3.5));
        assert_eq!(coerce_override_value("abc"), Value::from("abc"));
        assert_eq!(coerce_override_value("1.2.3"), Value::from("1.2.3"));
        assert_eq!(coerce_override_value("."), Value::from("."));
        assert_eq!(coerce_override_value(""), Value::from(""));
        assert_eq!(coerce_override_value("-4"), Value::from("-4"));
    }

    #[test]
    fn test_parse_override_splits_on_first_equals() {
        let (key, value) = parse_override(" storage_type =s3=eu").unwrap();
        assert_eq!(key, "storage_type");
        assert_eq!(value, Value::from("s3=eu"));

        assert!(matches!(
            parse_override("flag"),
            Err(PipelineError::InvalidOverride { .. })
        ));
        assert!(matches!(
            parse_override("=5"),
            Err(PipelineError::InvalidOverride { .. })
        ));
    }
}
