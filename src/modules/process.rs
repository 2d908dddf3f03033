//! Modules that run as external executables.
//!
//! A process module lives in `<modules_dir>/<name>/` and its entry point is
//! the executable `main` in that directory. The context is exported through
//! environment variables and the process runs with its input directory as
//! working directory. The call blocks until the process exits; a non-zero
//! exit status is a module failure.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

use super::Module;
use crate::domain::ModuleExecutionContext;
use crate::error::PipelineError;

/// File name of a process module's entry point
pub const ENTRY_POINT: &str = "main";

pub const ENV_MODULE_NAME: &str = "MODULE_NAME";
pub const ENV_MODULE_INPUT_PATH: &str = "MODULE_INPUT_PATH";
pub const ENV_MODULE_OUTPUT_PATH: &str = "MODULE_OUTPUT_PATH";
pub const ENV_MODULE_CONFIG: &str = "MODULE_CONFIG";

/// A module backed by an executable
#[derive(Debug, Clone)]
pub struct ProcessModule {
    name: String,
    entry_point: PathBuf,
}

impl ProcessModule {
    /// Create a process module with an explicit entry point
    pub fn new(name: impl Into<String>, entry_point: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Locate the entry point inside `module_dir`.
    ///
    /// Fails with a contract violation when the directory has no executable
    /// `main`.
    pub fn discover(name: &str, module_dir: &Path) -> crate::error::Result<Self> {
        let entry_point = module_dir.join(ENTRY_POINT);
        let violation = |reason: String| PipelineError::ModuleContractViolation {
            name: name.to_string(),
            reason,
        };

        if !entry_point.is_file() {
            return Err(violation(format!(
                "no '{}' entry point in {}",
                ENTRY_POINT,
                module_dir.display()
            )));
        }
        if !is_executable(&entry_point) {
            return Err(violation(format!(
                "entry point {} is not executable",
                entry_point.display()
            )));
        }

        Ok(Self::new(name, entry_point))
    }

    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }
}

impl Module for ProcessModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, context: &ModuleExecutionContext) -> Result<()> {
        let config = serde_json::to_string(context.config())
            .context("Failed to serialize module configuration")?;

        let output = Command::new(&self.entry_point)
            .current_dir(context.input_path())
            .env(ENV_MODULE_NAME, context.name())
            .env(ENV_MODULE_INPUT_PATH, context.input_path())
            .env(ENV_MODULE_OUTPUT_PATH, context.output_path())
            .env(ENV_MODULE_CONFIG, config)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| {
                format!("Failed to spawn module process {}", self.entry_point.display())
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(module = %self.name, "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Module process exited with code {}: {}",
                exit_code,
                stderr.trim()
            );
        }

        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_entry_point() {
        let module = ProcessModule::new("water_ingress", "/srv/modules/water_ingress/main");
        assert_eq!(module.name(), "water_ingress");
        assert_eq!(
            module.entry_point(),
            Path::new("/srv/modules/water_ingress/main")
        );
    }

    // Spawning real executables is covered in tests/pipeline.rs
}
