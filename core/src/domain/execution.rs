use crate::domain::command::CommandError;
use crate::domain::context::EnvError;
use crate::domain::runtime::RuntimeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Orchestrator state machine. Transitions are strictly forward:
/// `Idle → DependenciesReady → EnvironmentReady → Executing → Done`.
/// Terminal states are final; there is no retry, resume or rollback of
/// dependency containers once a command has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionPhase {
    Idle,
    DependenciesReady,
    EnvironmentReady,
    Executing,
    Succeeded,
    Failed,
}

impl ExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionPhase::Succeeded | ExecutionPhase::Failed)
    }
}

/// Outcome of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub project: String,
    pub phase: ExecutionPhase,
    pub commands_completed: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ExecutionReport {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            phase: ExecutionPhase::Idle,
            commands_completed: 0,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn finish(&mut self, phase: ExecutionPhase) {
        self.phase = phase;
        self.ended_at = Some(Utc::now());
    }
}

/// Top-level failure taxonomy for one orchestrator run. Each variant names
/// the stage that failed; the underlying cause rides along. Fail-fast
/// everywhere: no stage is retried and no later stage is attempted.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("could not prepare project for execution: {0}")]
    Setup(String),
    #[error("dependency provisioning failed: {0}")]
    Provision(#[from] RuntimeError),
    #[error("environment expansion failed: {0}")]
    Environment(#[from] EnvError),
    #[error("command execution failed: {0}")]
    Command(#[from] CommandError),
}
