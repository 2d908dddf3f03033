//! The context handed to a module invocation.

use std::path::{Path, PathBuf};

use crate::config::ModuleConfig;

/// Reserved config key holding the module's private input directory
pub const MODULE_INPUT_PATH_KEY: &str = "module_input_path";

/// Reserved config key holding the module's private output directory
pub const MODULE_OUTPUT_PATH_KEY: &str = "module_output_path";

/// Everything a module may look at while it runs.
///
/// Built once per invocation and never mutated afterwards. The input and
/// output directories exist, are private to this module and do not overlap.
#[derive(Debug, Clone)]
pub struct ModuleExecutionContext {
    name: String,
    input_path: PathBuf,
    output_path: PathBuf,
    config: ModuleConfig,
}

impl ModuleExecutionContext {
    pub fn new(
        name: String,
        input_path: PathBuf,
        output_path: PathBuf,
        config: ModuleConfig,
    ) -> Self {
        Self {
            name,
            input_path,
            output_path,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory the module reads from
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Directory the module writes to
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Effective configuration: the module's section plus the reserved
    /// path keys
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }
}
