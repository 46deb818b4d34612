// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT
//! Project Manifest YAML Parser
//!
//! This module provides infrastructure for parsing project YAML manifests
//! into domain objects.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects
//! - **Anti-Corruption:** Translates YAML schema to domain model
//!
//! # Manifest Format
//!
//! ```yaml
//! apiVersion: runway.dev/v1
//! kind: ProjectManifest
//! metadata:
//!   name: api-server
//! spec:
//!   exec:
//!     dependencies:
//!       db:
//!         image: postgres:15
//!         ports:
//!           - "5432"
//!     environment:
//!       default:
//!         - DATABASE_HOST={{db.host}}
//!     commands:
//!       - cargo run
//! ```

use crate::domain::manifest::ProjectManifest;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// File names probed by `discover`, in order.
const MANIFEST_FILE_NAMES: [&str; 2] = ["runway.yml", "runway.yaml"];

pub struct ProjectManifestParser;

impl ProjectManifestParser {
    /// Parse a project manifest from a YAML string
    pub fn parse_yaml(yaml: &str) -> Result<ProjectManifest> {
        let manifest: ProjectManifest =
            serde_yaml::from_str(yaml).context("Failed to parse YAML manifest")?;

        manifest
            .validate()
            .map_err(|e| anyhow!("Manifest validation failed: {}", e))?;

        Ok(manifest)
    }

    /// Parse a project manifest from a YAML file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ProjectManifest> {
        let yaml = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read manifest file: {:?}", path.as_ref()))?;

        Self::parse_yaml(&yaml)
    }

    /// Find and parse the manifest in a project directory
    pub fn discover<P: AsRef<Path>>(project_dir: P) -> Result<ProjectManifest> {
        for name in MANIFEST_FILE_NAMES {
            let candidate = project_dir.as_ref().join(name);
            if candidate.is_file() {
                return Self::parse_file(candidate);
            }
        }
        Err(anyhow!(
            "No project manifest found in {:?} (looked for {})",
            project_dir.as_ref(),
            MANIFEST_FILE_NAMES.join(", ")
        ))
    }

    /// Serialize a project manifest to a YAML string
    pub fn to_yaml(manifest: &ProjectManifest) -> Result<String> {
        serde_yaml::to_string(manifest).context("Failed to serialize manifest to YAML")
    }
}
