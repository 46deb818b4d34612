// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

//! # Runway CLI
//!
//! The `runway` binary runs a project the way its `runway.yml` declares:
//! dependency containers first, then the computed environment, then the
//! project's commands in order.
//!
//! ## Commands
//!
//! - `runway exec [PROJECT]` - Provision dependencies and run the project
//! - `runway check [PROJECT]` - Validate the project manifest

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod datadirs;

use commands::{CheckCommand, ExecCommand};

/// Runway - run a project and its service dependencies
#[derive(Parser)]
#[command(name = "runway")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUNWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a project, as specified by its manifest's exec block
    #[command(name = "exec")]
    Exec {
        #[command(flatten)]
        command: ExecCommand,
    },

    /// Validate a project manifest
    #[command(name = "check")]
    Check {
        #[command(flatten)]
        command: CheckCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Exec { command }) => commands::exec::execute(command).await,
        Some(Commands::Check { command }) => commands::check::execute(command).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
