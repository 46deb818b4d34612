// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

//! `runway exec` - provision dependencies and run the project
//!
//! Executing a project involves:
//! 1. Start any declared dependency containers
//! 2. Expand the environment against the running dependencies
//! 3. Run the manifest's commands, in order, in the project directory

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use runway_core::application::orchestrator::{ExecOptions, ExecOrchestrator};
use runway_core::application::provisioner::DependencyProvisioner;
use runway_core::domain::manifest::DEFAULT_ENVIRONMENT;
use runway_core::infrastructure::docker::DockerConnector;
use runway_core::infrastructure::manifest_parser::ProjectManifestParser;
use runway_core::infrastructure::process::ProcessCommandRunner;

use crate::datadirs::DataDirs;

#[derive(Args)]
pub struct ExecCommand {
    /// Project directory (defaults to the current directory)
    #[arg(value_name = "PROJECT")]
    project: Option<PathBuf>,

    /// Environment to run as
    #[arg(short = 'e', long = "environment", default_value = DEFAULT_ENVIRONMENT)]
    environment: String,

    /// Also export the computed environment process-wide
    #[arg(long)]
    export_env: bool,

    /// Per-command timeout in seconds (no timeout when omitted)
    #[arg(long, value_name = "SECONDS")]
    command_timeout: Option<u64>,

    /// Docker socket path override
    #[arg(long, env = "RUNWAY_DOCKER_SOCKET")]
    docker_socket: Option<String>,
}

pub async fn execute(cmd: ExecCommand) -> Result<()> {
    let project_dir = match cmd.project {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    let project_dir = project_dir
        .canonicalize()
        .with_context(|| format!("Project directory '{}' not found", project_dir.display()))?;

    let manifest = ProjectManifestParser::discover(&project_dir)?;

    let data_dirs = DataDirs::from_env().context("Could not prepare data directories")?;
    let build_root = data_dirs
        .build_root(&manifest.metadata.name)
        .context("Could not prepare project build root")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping...");
            signal_token.cancel();
        }
    });

    let provisioner = DependencyProvisioner::new(
        Arc::new(DockerConnector::new(cmd.docker_socket)),
        manifest.metadata.name.clone(),
        build_root,
    );
    let orchestrator = ExecOrchestrator::new(
        provisioner,
        Arc::new(ProcessCommandRunner::new()),
        ExecOptions {
            environment: cmd.environment,
            export_process_env: cmd.export_env,
            command_timeout: cmd.command_timeout.map(Duration::from_secs),
            cancel,
        },
    );

    match orchestrator.run(&manifest, &project_dir).await {
        Ok(report) => {
            println!(
                "{}",
                format!(
                    "✓ {} finished: {} command(s) completed",
                    manifest.metadata.name, report.commands_completed
                )
                .green()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("✗ {}", e).red());
            std::process::exit(1);
        }
    }
}
