//! Run state for a single pipeline execution.
//!
//! A Run tracks where each module is in its PREPARE -> INVOKE -> COLLECT
//! cycle and whether the run as a whole finished or failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pipeline execution run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Execution identifier (matches the run directory name)
    pub id: String,

    /// Current state of the run
    pub state: RunState,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed (if applicable)
    pub completed_at: Option<DateTime<Utc>>,

    /// Status of each module, in execution order
    pub modules: Vec<(String, ModuleStatus)>,
}

impl Run {
    /// Create a run with every module pending
    pub fn new(id: impl Into<String>, execution_order: &[String]) -> Self {
        Self {
            id: id.into(),
            state: RunState::Init,
            started_at: Utc::now(),
            completed_at: None,
            modules: execution_order
                .iter()
                .map(|name| (name.clone(), ModuleStatus::Pending))
                .collect(),
        }
    }

    /// Move the module at `index` to `status`
    pub fn set_status(&mut self, index: usize, status: ModuleStatus) {
        if let Some((_, current)) = self.modules.get_mut(index) {
            *current = status;
        }
        if self.state == RunState::Init {
            self.state = RunState::Running;
        }
    }

    /// Mark the run as completed successfully
    pub fn complete(&mut self) {
        self.state = RunState::Done;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed on `module`
    pub fn fail(&mut self, module: &str, error: impl Into<String>) {
        self.state = RunState::Failed {
            module: module.to_string(),
            error: error.into(),
        };
        self.completed_at = Some(Utc::now());
    }

    /// Status of a module by name
    pub fn status_of(&self, module: &str) -> Option<ModuleStatus> {
        self.modules
            .iter()
            .find(|(name, _)| name == module)
            .map(|(_, status)| *status)
    }

    /// Check if the run has completed (successfully or not)
    pub fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Done | RunState::Failed { .. })
    }
}

/// State of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunState {
    /// Created, no module started yet
    #[default]
    Init,

    /// Working through the execution order
    Running,

    /// Every module completed
    Done,

    /// Aborted on the first failing module
    Failed { module: String, error: String },
}

/// Where a single module is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Pending,
    Preparing,
    Invoking,
    Collecting,
    Completed,
    Failed,
}
