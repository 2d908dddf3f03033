//! Domain types for the pipeline runner.
//!
//! This module contains the core data structures:
//! - ModuleExecutionContext: What a module sees while it runs
//! - Run: Pipeline execution state

pub mod context;
pub mod run;

// Re-export commonly used types
pub use context::{ModuleExecutionContext, MODULE_INPUT_PATH_KEY, MODULE_OUTPUT_PATH_KEY};
pub use run::{ModuleStatus, Run, RunState};
