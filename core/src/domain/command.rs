use crate::domain::context::EnvMap;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not start '{command}': {reason}")]
    StartFailed { command: String, reason: String },
    #[error("command '{command}' failed: {reason}")]
    Failed { command: String, reason: String },
    #[error("command '{command}' was cancelled")]
    Cancelled { command: String },
    #[error("command '{command}' timed out after {}s", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },
}

/// Options for a single command invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Cancelling the token kills the child's whole process group.
    pub cancel: CancellationToken,
    /// Optional deadline; expiry takes the same kill path as cancellation.
    pub timeout: Option<Duration>,
}

/// Runs one external command to completion.
///
/// The command line is split on whitespace into a program and literal
/// arguments. No shell semantics: quoting, globbing, pipes and redirection
/// are not interpreted. A command that needs them must invoke a shell
/// explicitly, e.g. `sh -c "..."` pre-quoted by the caller.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        dir: &Path,
        env: &EnvMap,
        opts: &RunOptions,
    ) -> Result<(), CommandError>;
}
