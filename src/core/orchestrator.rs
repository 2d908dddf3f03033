//! Main orchestrator for pipeline execution.
//!
//! Runs modules strictly one at a time in the configured order. Each module
//! goes through PREPARE -> INVOKE -> COLLECT; the first failure aborts the
//! run and later modules are never prepared.

use std::time::Instant;

use tracing::{error, info, instrument};

use crate::config::RuntimeConfig;
use crate::domain::{ModuleStatus, Run};
use crate::error::Result;
use crate::modules::{self, ModuleRegistry};

use super::context;
use super::lifecycle::ExecutionPaths;

/// Main pipeline orchestrator
pub struct Orchestrator {
    registry: ModuleRegistry,
}

impl Orchestrator {
    /// Create an orchestrator over a populated registry
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Execute every module in `execution_order`.
    ///
    /// Returns the finished run, or the first module's error unchanged.
    pub fn run_all(&self, config: &RuntimeConfig, paths: &ExecutionPaths) -> Result<Run> {
        let mut run = Run::new(paths.execution_id.clone(), &config.general.execution_order);
        self.execute(config, paths, &mut run)?;
        Ok(run)
    }

    /// Drive `run` through the execution order, recording each module's
    /// status. On failure the run is left in its failed state and logged.
    #[instrument(skip_all, fields(execution_id = %paths.execution_id))]
    pub fn execute(&self, config: &RuntimeConfig, paths: &ExecutionPaths, run: &mut Run) -> Result<()> {
        let order = &config.general.execution_order;
        info!(modules = ?order, "Starting execution of all modules");

        for (index, module_name) in order.iter().enumerate() {
            let started = Instant::now();
            if let Err(e) = self.run_module(run, index, module_name, config, paths) {
                run.set_status(index, ModuleStatus::Failed);
                run.fail(module_name, e.to_string());
                error!(module = %module_name, error = %e, run = ?run, "Run aborted");
                return Err(e);
            }
            info!(
                module = %module_name,
                duration_ms = started.elapsed().as_millis() as u64,
                "Module finished"
            );
        }

        run.complete();
        info!("All modules executed successfully");
        Ok(())
    }

    fn run_module(
        &self,
        run: &mut Run,
        index: usize,
        module_name: &str,
        config: &RuntimeConfig,
        paths: &ExecutionPaths,
    ) -> Result<()> {
        run.set_status(index, ModuleStatus::Preparing);
        info!(module = module_name, "Preparing execution context");
        let module_context = context::prepare(config, module_name, paths)?;

        run.set_status(index, ModuleStatus::Invoking);
        self.registry.execute(&module_context)?;

        run.set_status(index, ModuleStatus::Collecting);
        modules::collect_output(&module_context, paths)?;

        run.set_status(index, ModuleStatus::Completed);
        Ok(())
    }
}
