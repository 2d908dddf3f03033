//! Per-module workspace preparation.
//!
//! Each module gets `<run>/<module>/input` and `<run>/<module>/output`.
//! The input directory is populated in this order, later copies winning on
//! name collisions:
//! 1. The global input tree (`load_all_files`) or the module's `input_files`
//! 2. Everything accumulated in the run's shared output so far (chaining)

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::lifecycle::ExecutionPaths;
use super::workspace;
use crate::config::RuntimeConfig;
use crate::domain::{ModuleExecutionContext, MODULE_INPUT_PATH_KEY, MODULE_OUTPUT_PATH_KEY};
use crate::error::{PipelineError, Result};

/// Module config key listing files to copy when `load_all_files` is off
pub const INPUT_FILES_KEY: &str = "input_files";

/// Build the execution context for `module_name`, creating and populating
/// its workspace.
#[instrument(skip(config, paths), fields(execution_id = %paths.execution_id))]
pub fn prepare(
    config: &RuntimeConfig,
    module_name: &str,
    paths: &ExecutionPaths,
) -> Result<ModuleExecutionContext> {
    let module_root = paths.module_root(module_name)?;
    let module_input = workspace::ensure_directory(&module_root.join("input"))?;
    let module_output = workspace::ensure_directory(&module_root.join("output"))?;

    let mut module_config = config.module_config(module_name);
    module_config.insert(
        MODULE_INPUT_PATH_KEY.to_string(),
        Value::String(module_input.to_string_lossy().into_owned()),
    );
    module_config.insert(
        MODULE_OUTPUT_PATH_KEY.to_string(),
        Value::String(module_output.to_string_lossy().into_owned()),
    );

    if config.general.load_all_files {
        workspace::copy_tree(&config.general.input_path, &module_input)?;
    } else {
        for file in declared_input_files(module_name, &module_config)? {
            copy_declared_file(Path::new(file), &module_input)?;
        }
    }

    if !workspace::is_empty(&paths.output)? {
        debug!("Chaining accumulated output into module input");
        workspace::copy_tree(&paths.output, &module_input)?;
    }

    info!(module = module_name, "Prepared execution context");
    Ok(ModuleExecutionContext::new(
        module_name.to_string(),
        module_input,
        module_output,
        module_config,
    ))
}

fn declared_input_files<'a>(
    module_name: &str,
    module_config: &'a crate::config::ModuleConfig,
) -> Result<Vec<&'a str>> {
    let contract_error = || PipelineError::ModuleContractViolation {
        name: module_name.to_string(),
        reason: format!("'{}' must be a list of file names", INPUT_FILES_KEY),
    };

    match module_config.get(INPUT_FILES_KEY) {
        None => Ok(Vec::new()),
        Some(Value::Array(files)) => files
            .iter()
            .map(|f| f.as_str().ok_or_else(contract_error))
            .collect(),
        Some(_) => Err(contract_error()),
    }
}

/// Copy a declared file by basename. A missing file is left for the module
/// to trip over.
fn copy_declared_file(file: &Path, module_input: &Path) -> Result<()> {
    let Some(file_name) = file.file_name() else {
        warn!(file = %file.display(), "Declared input has no file name, skipped");
        return Ok(());
    };

    if !file.is_file() {
        warn!(file = %file.display(), "Declared input file not found, skipped");
        return Ok(());
    }

    workspace::copy_file(file, &module_input.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_input_files() {
        let config = json!({ "input_files": ["a.csv", "dir/b.csv"] });
        let config = config.as_object().unwrap();
        assert_eq!(declared_input_files("m", config).unwrap(), vec!["a.csv", "dir/b.csv"]);

        let config = json!({ "input_files": "a.csv" });
        assert!(matches!(
            declared_input_files("m", config.as_object().unwrap()),
            Err(PipelineError::ModuleContractViolation { .. })
        ));

        let config = json!({});
        assert!(declared_input_files("m", config.as_object().unwrap()).unwrap().is_empty());
    }
}
