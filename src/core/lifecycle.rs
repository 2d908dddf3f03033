//! Execution identity and the run directory tree.
//!
//! ```text
//! {base}/
//! └── execution-20250101-120000-<uuid>/
//!     ├── execution-input/     (input mirror, reserved)
//!     ├── execution-output/    (shared output accumulator)
//!     └── <module>/
//!         ├── input/
//!         └── output/
//! ```

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::workspace;
use crate::error::{PipelineError, Result};

/// Prefix of every execution identifier
pub const EXECUTION_PREFIX: &str = "execution";

/// Run-level input mirror, never a module name
pub const EXECUTION_INPUT_DIR: &str = "execution-input";

/// Run-level shared output accumulator, never a module name
pub const EXECUTION_OUTPUT_DIR: &str = "execution-output";

/// Paths of a single run, fixed at run start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPaths {
    /// `execution-<UTC yyyymmdd-HHMMSS>-<uuid v4>`
    pub execution_id: String,
    /// Root of this run's tree
    pub root: PathBuf,
    /// Input mirror directory
    pub input: PathBuf,
    /// Shared output accumulator
    pub output: PathBuf,
}

impl ExecutionPaths {
    /// Derive the paths for `execution_id` under `base` without touching disk
    pub fn for_id(base: &Path, execution_id: impl Into<String>) -> Self {
        let execution_id = execution_id.into();
        let root = base.join(&execution_id);
        Self {
            input: root.join(EXECUTION_INPUT_DIR),
            output: root.join(EXECUTION_OUTPUT_DIR),
            root,
            execution_id,
        }
    }

    /// Directory owned by `module` within this run.
    ///
    /// The name must be a single plain path component other than the run's
    /// own input and output directories, so the module tree stays directly
    /// under the run root and apart from the shared accumulator.
    pub fn module_root(&self, module: &str) -> Result<PathBuf> {
        let violation = |reason: &str| PipelineError::ModuleContractViolation {
            name: module.to_string(),
            reason: reason.to_string(),
        };

        let mut components = Path::new(module).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == module => {}
            _ => return Err(violation("module name must be a single plain path component")),
        }
        if module == EXECUTION_INPUT_DIR || module == EXECUTION_OUTPUT_DIR {
            return Err(violation("module name collides with a reserved run directory"));
        }

        Ok(self.root.join(module))
    }
}

/// Mint a time-sortable, collision-free execution identifier
pub fn generate_execution_id() -> String {
    format!(
        "{}-{}-{}",
        EXECUTION_PREFIX,
        Utc::now().format("%Y%m%d-%H%M%S"),
        Uuid::new_v4()
    )
}

/// Start a run: allocate its identity and create its root and shared
/// output directories.
pub fn begin(base: &Path) -> Result<ExecutionPaths> {
    let paths = ExecutionPaths::for_id(base, generate_execution_id());

    workspace::ensure_directory(&paths.root)?;
    workspace::ensure_directory(&paths.output)?;

    info!(execution_id = %paths.execution_id, root = %paths.root.display(), "Execution started");
    Ok(paths)
}

/// Finish a run, purging its whole tree when `purge` is set.
pub fn end(paths: &ExecutionPaths, purge: bool) -> Result<()> {
    if purge {
        workspace::safe_delete(&paths.root)?;
        info!(execution_id = %paths.execution_id, "Execution data deleted");
    } else {
        info!(
            execution_id = %paths.execution_id,
            root = %paths.root.display(),
            "Execution data retained"
        );
    }
    Ok(())
}
