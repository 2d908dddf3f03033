//! Error types for the pipeline runner.
//!
//! Startup errors (config, overrides) are raised before any module runs.
//! Workspace and module errors abort the run at module granularity.

use std::path::PathBuf;

use thiserror::Error;

/// Every failure the orchestration core can surface
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration file not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse configuration {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid override '{raw}': {reason}")]
    InvalidOverride { raw: String, reason: String },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path '{}' does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("Path '{}' is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("No module registered or discovered for '{name}'")]
    ModuleNotFound { name: String },

    #[error("Module '{name}' violates the module contract: {reason}")]
    ModuleContractViolation { name: String, reason: String },

    #[error("Module '{name}' failed: {source:#}")]
    ModuleFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Wrap an IO error with the operation and path it came from
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Name of the module this error belongs to, if any
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Self::ModuleNotFound { name }
            | Self::ModuleContractViolation { name, .. }
            | Self::ModuleFailed { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_is_carried() {
        let err = PipelineError::ModuleFailed {
            name: "water_ingress".to_string(),
            source: anyhow::anyhow!("missing atg_result.csv"),
        };
        assert_eq!(err.module_name(), Some("water_ingress"));
        assert!(err.to_string().contains("missing atg_result.csv"));

        let err = PipelineError::NotFound {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(err.module_name(), None);
    }
}
