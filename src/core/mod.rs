//! Core orchestration logic.
//!
//! This module contains:
//! - Workspace: File-system primitives for run and module directories
//! - Lifecycle: Execution identity and run directory tree
//! - Context: Per-module workspace preparation and chaining
//! - Orchestrator: Main execution engine

pub mod context;
pub mod lifecycle;
pub mod orchestrator;
pub mod workspace;

// Re-export commonly used types
pub use context::prepare;
pub use lifecycle::{begin, end, generate_execution_id, ExecutionPaths};
pub use orchestrator::Orchestrator;
