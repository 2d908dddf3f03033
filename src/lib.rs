//! sunshine - Configuration-driven pipeline runner
//!
//! Executes a named sequence of independent modules, each in its own
//! workspace, with the output of every completed module made visible to the
//! ones after it.
//!
//! # Architecture
//!
//! - Each run gets a unique execution directory
//! - Each module gets private `input/` and `output/` directories
//! - Module output is accumulated in the run's shared output directory and
//!   copied into the input of every later module (chaining)
//! - The first failing module aborts the run
//!
//! # Modules
//!
//! - `config`: Configuration loading, overrides, project root discovery
//! - `core`: Orchestration logic (Workspace, Lifecycle, Context, Orchestrator)
//! - `domain`: Data structures (ModuleExecutionContext, Run)
//! - `modules`: Module contract, registry and process modules
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the pipeline from <project root>/app-config.yaml
//! sunshine
//!
//! # Use another config and override a top-level key
//! sunshine --config ./staging.yaml --overrides standard_temperature=20
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod modules;

// Re-export main types at crate root for convenience
pub use crate::config::{GeneralConfig, ModuleConfig, RuntimeConfig};
pub use crate::core::{ExecutionPaths, Orchestrator};
pub use crate::domain::{ModuleExecutionContext, ModuleStatus, Run, RunState};
pub use crate::error::{PipelineError, Result};
pub use crate::modules::{Module, ModuleRegistry, ProcessModule};
