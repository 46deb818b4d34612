// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

//! `runway check` - validate a project manifest and summarize its exec block

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use runway_core::infrastructure::manifest_parser::ProjectManifestParser;

#[derive(Args)]
pub struct CheckCommand {
    /// Project directory (defaults to the current directory)
    #[arg(value_name = "PROJECT")]
    project: Option<PathBuf>,
}

pub async fn execute(cmd: CheckCommand) -> Result<()> {
    let project_dir = match cmd.project {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not determine current directory")?,
    };

    println!("Validating project manifest...");

    let manifest = ProjectManifestParser::discover(&project_dir)?;
    let exec = &manifest.spec.exec;

    println!("{}", "✓ Manifest is valid".green());
    println!();

    println!("{}", format!("Project: {}", manifest.metadata.name).bold());

    println!("{}", "Dependencies:".bold());
    if exec.dependencies.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (label, descriptor) in &exec.dependencies {
        println!("  {} ({})", label.bold(), descriptor.image);
        if !descriptor.ports.is_empty() {
            println!("    Ports: {}", descriptor.ports.join(", "));
        }
    }

    println!("{}", "Environments:".bold());
    if exec.environment.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (name, bindings) in &exec.environment {
        println!("  {}: {} binding(s)", name, bindings.len());
    }

    println!("{}", "Commands:".bold());
    for command in &exec.commands {
        println!("  - {}", command);
    }

    if !exec.log_files.is_empty() {
        println!("{}", "Log files:".bold());
        for log_file in &exec.log_files {
            println!("  - {}", log_file);
        }
    }

    Ok(())
}
