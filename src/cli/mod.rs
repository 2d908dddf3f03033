//! Command-line interface for sunshine.
//!
//! A single command: load the configuration, run every module in
//! `execution_order`, and exit non-zero on the first failure.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, error, info};

use crate::config::{self, paths};
use crate::core::{self as pipeline, Orchestrator};
use crate::modules::ModuleRegistry;

/// sunshine - Configuration-driven pipeline runner
#[derive(Parser, Debug)]
#[command(name = "sunshine")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file; TOML is not read
    /// (default: <project root>/app-config.yaml)
    #[arg(short, long, env = "SUNSHINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also load the configuration section of this module
    #[arg(short, long)]
    pub module: Option<String>,

    /// Override configuration values at runtime (e.g. --overrides foo=bar baz=42
    /// delete_execution_data=true)
    #[arg(short, long, num_args = 1.., value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// Log level for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Cli {
    /// Execute the pipeline
    pub fn execute(self) -> Result<()> {
        info!("Execution starting");
        let project_root = paths::find_project_root();
        let registry = ModuleRegistry::new().with_modules_dir(paths::modules_dir(&project_root));

        let result = self.run_pipeline(&project_root, registry);
        match &result {
            Ok(()) => info!("Execution finished"),
            Err(e) => error!("Execution failed: {:#}", e),
        }
        info!("The process has completed");
        result
    }

    fn run_pipeline(&self, project_root: &Path, registry: ModuleRegistry) -> Result<()> {
        let runtime_config = config::load(
            self.module.as_deref(),
            self.config.as_deref(),
            &self.overrides,
            project_root,
        )
        .context("Failed to load configuration")?;

        let execution_base = if runtime_config.general.execution_path.as_os_str().is_empty() {
            project_root.to_path_buf()
        } else {
            runtime_config.general.execution_path.clone()
        };

        let execution_paths = pipeline::begin(&execution_base)?;
        info!(execution_id = %execution_paths.execution_id, "Execution ID");
        debug!(
            execution_order = ?runtime_config.general.execution_order,
            "Execution order"
        );

        let orchestrator = Orchestrator::new(registry);
        // A failed run keeps its directory for inspection
        let run = orchestrator
            .run_all(&runtime_config, &execution_paths)
            .with_context(|| format!("Execution {} failed", execution_paths.execution_id))?;
        debug!(state = ?run.state, "Run finished");

        pipeline::end(&execution_paths, runtime_config.general.delete_execution_data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "sunshine",
            "--config",
            "staging.yaml",
            "--overrides",
            "standard_temperature=20",
            "storage_type=s3",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("staging.yaml")));
        assert_eq!(cli.overrides, vec!["standard_temperature=20", "storage_type=s3"]);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.module.is_none());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sunshine"]);

        assert!(cli.overrides.is_empty());
        assert_eq!(cli.log_level.as_str(), "info");
    }

    #[test]
    fn test_config_help_names_format() {
        use clap::CommandFactory;

        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        let help = config.get_help().unwrap().to_string();

        assert!(help.contains("YAML"), "{}", help);
        assert!(help.contains("app-config.yaml"), "{}", help);
    }
}
