//! Execution Orchestrator
//!
//! Sequences one project run: provision dependencies, expand the
//! environment, then execute the manifest's commands in order.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Drive the `Idle → DependenciesReady → EnvironmentReady →
//!   Executing → Done` state machine for one `runway exec` invocation
//! - **Dependencies:** Application (Provisioner, Expander), Domain
//!   (CommandRunner), the per-run BuildContext
//!
//! Control flow is strictly sequential: a stage never starts until the
//! previous one fully succeeded, commands run one at a time, and the first
//! command failure ends the run. Terminal states are final; there is no
//! retry and no rollback of dependency containers after a command failure.

use crate::application::environment::EnvironmentExpander;
use crate::application::provisioner::DependencyProvisioner;
use crate::domain::command::{CommandRunner, RunOptions};
use crate::domain::context::BuildContext;
use crate::domain::execution::{ExecError, ExecutionPhase, ExecutionReport};
use crate::domain::manifest::{ProjectManifest, DEFAULT_ENVIRONMENT};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Options for one orchestrator run.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Named environment applied on top of "default"
    pub environment: String,
    /// Also push the expanded environment into the process-wide
    /// environment table. Off by default: commands receive the map
    /// explicitly at spawn time, so nothing outside the run observes it.
    pub export_process_env: bool,
    /// Optional per-command deadline
    pub command_timeout: Option<Duration>,
    /// Cancels container starts and kills the running command's group
    pub cancel: CancellationToken,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            export_process_env: false,
            command_timeout: None,
            cancel: CancellationToken::new(),
        }
    }
}

pub struct ExecOrchestrator {
    provisioner: DependencyProvisioner,
    expander: EnvironmentExpander,
    runner: Arc<dyn CommandRunner>,
    options: ExecOptions,
}

impl ExecOrchestrator {
    pub fn new(
        provisioner: DependencyProvisioner,
        runner: Arc<dyn CommandRunner>,
        options: ExecOptions,
    ) -> Self {
        Self {
            provisioner,
            expander: EnvironmentExpander::new(),
            runner,
            options,
        }
    }

    /// Run the manifest's exec block with `project_dir` as the working
    /// directory for every command. Returns the report on success; on
    /// failure the error names the failing stage and underlying cause.
    pub async fn run(
        &self,
        manifest: &ProjectManifest,
        project_dir: &Path,
    ) -> Result<ExecutionReport, ExecError> {
        let exec = &manifest.spec.exec;
        let mut report = ExecutionReport::new(&manifest.metadata.name);

        if !project_dir.is_dir() {
            return Err(ExecError::Setup(format!(
                "project directory '{}' does not exist",
                project_dir.display()
            )));
        }

        let mut context = BuildContext::new();

        // Idle → DependenciesReady. Skipped entirely when the manifest
        // declares no dependencies.
        if !exec.dependencies.is_empty() {
            context.containers = self
                .provisioner
                .start_all(&exec.dependencies, &self.options.cancel)
                .await?;
        }
        report.phase = ExecutionPhase::DependenciesReady;

        // DependenciesReady → EnvironmentReady.
        info!("Setting environment variables...");
        let selected = self.selected_bindings(manifest);
        context.exported_env = self.expander.expand(
            exec.bindings(DEFAULT_ENVIRONMENT),
            selected,
            &context,
        )?;
        if self.options.export_process_env {
            context.export_to_process();
        }
        report.phase = ExecutionPhase::EnvironmentReady;

        for log_file in &exec.log_files {
            info!("Will tail {}...", log_file);
        }

        // EnvironmentReady → Executing → Done.
        report.phase = ExecutionPhase::Executing;
        info!("Running project {}...", manifest.metadata.name);
        let run_opts = RunOptions {
            cancel: self.options.cancel.clone(),
            timeout: self.options.command_timeout,
        };
        for command in &exec.commands {
            match self
                .runner
                .run(command, project_dir, &context.exported_env, &run_opts)
                .await
            {
                Ok(()) => report.commands_completed += 1,
                Err(e) => {
                    report.finish(ExecutionPhase::Failed);
                    return Err(e.into());
                }
            }
        }

        report.finish(ExecutionPhase::Succeeded);
        Ok(report)
    }

    /// Bindings for the selected environment, or None when the caller
    /// stayed on "default". A selected name the manifest does not declare
    /// contributes nothing, matching the manifest's lenient map lookup,
    /// but is surfaced to the user.
    fn selected_bindings<'a>(&self, manifest: &'a ProjectManifest) -> Option<&'a [String]> {
        if self.options.environment == DEFAULT_ENVIRONMENT {
            return None;
        }
        if !manifest
            .spec
            .exec
            .environment
            .contains_key(&self.options.environment)
        {
            warn!(
                environment = %self.options.environment,
                "Selected environment is not declared in the manifest"
            );
        }
        Some(manifest.spec.exec.bindings(&self.options.environment))
    }
}
