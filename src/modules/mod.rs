//! Module registry and invocation.
//!
//! A module is anything that can run against a [`ModuleExecutionContext`]:
//! read from its input directory, write to its output directory, and either
//! return normally or fail.
//!
//! Names resolve in two places, in order:
//! - modules registered in-process with [`ModuleRegistry::register`]
//! - process modules discovered under the modules directory
//!   (`<modules_dir>/<name>/main`)

pub mod process;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::lifecycle::ExecutionPaths;
use crate::core::workspace;
use crate::domain::ModuleExecutionContext;
use crate::error::{PipelineError, Result};

pub use process::{ProcessModule, ENTRY_POINT};

/// The contract every pipeline module implements
pub trait Module: Send + Sync {
    /// Name the module is registered under
    fn name(&self) -> &str;

    /// Run against the prepared workspace
    fn run(&self, context: &ModuleExecutionContext) -> anyhow::Result<()>;
}

/// Name -> module lookup, populated once at startup
#[derive(Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn Module>>,
    modules_dir: Option<PathBuf>,
}

impl ModuleRegistry {
    /// Create an empty registry with no discovery directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Also discover process modules under `dir`
    pub fn with_modules_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = Some(dir.into());
        self
    }

    /// Register an in-process module under its own name
    pub fn register(&mut self, module: impl Module + 'static) -> &mut Self {
        let name = module.name().to_string();
        if self.modules.insert(name.clone(), Arc::new(module)).is_some() {
            warn!(module = %name, "Module registered twice, keeping the latest");
        }
        self
    }

    /// Names of the in-process modules
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Resolve a module name to something invocable
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Module>> {
        if let Some(module) = self.modules.get(name) {
            return Ok(Arc::clone(module));
        }

        let Some(modules_dir) = &self.modules_dir else {
            return Err(PipelineError::ModuleNotFound {
                name: name.to_string(),
            });
        };

        let module_dir = modules_dir.join(name);
        if !module_dir.is_dir() {
            return Err(PipelineError::ModuleNotFound {
                name: name.to_string(),
            });
        }

        ProcessModule::discover(name, &module_dir).map(|m| Arc::new(m) as Arc<dyn Module>)
    }

    /// Run the module named by `context` and collect its output into the
    /// run's shared accumulator.
    pub fn invoke(&self, context: &ModuleExecutionContext, paths: &ExecutionPaths) -> Result<()> {
        self.execute(context)?;
        collect_output(context, paths)
    }

    /// Resolve and run the module named by `context`, without collecting
    pub fn execute(&self, context: &ModuleExecutionContext) -> Result<()> {
        let name = context.name();
        info!(module = name, "Starting module execution");

        let module = self.resolve(name).inspect_err(|e| {
            error!(module = name, error = %e, "Could not resolve module");
        })?;

        module.run(context).map_err(|source| {
            error!(module = name, error = %format!("{:#}", source), "Module execution failed");
            PipelineError::ModuleFailed {
                name: name.to_string(),
                source,
            }
        })?;
        info!(module = name, "Module execution completed");
        Ok(())
    }
}

/// Merge a module's output directory into the shared accumulator.
///
/// A module that left no output directory behind is not a failure.
pub fn collect_output(context: &ModuleExecutionContext, paths: &ExecutionPaths) -> Result<()> {
    if context.output_path().exists() {
        workspace::copy_tree(context.output_path(), &paths.output)?;
        info!(module = context.name(), "Module output copied to execution output");
    } else {
        warn!(module = context.name(), "No output found for module, nothing copied");
    }
    Ok(())
}
