// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

// Project Manifest Types
//
// Defines the schema for a project's runway.yml, including:
// - Kubernetes-style envelope (apiVersion/kind/metadata/spec)
// - The exec block: dependency containers, named environments, commands
// - Container descriptors interpreted by the service runtime

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The environment name that is always applied before any selected one.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Top-level Kubernetes-style project manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// API version (must be "runway.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ProjectManifest")
    pub kind: String,

    /// Project metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Project specification
    pub spec: ProjectSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable project name (unique identifier)
    pub name: String,

    /// Optional: Manifest version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Project specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Run instructions for `runway exec`
    pub exec: ExecSpec,
}

/// The exec block: what it takes to run this project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecSpec {
    /// Dependency containers, keyed by label. Labels are unique by
    /// construction; iteration order is not stable across runs.
    #[serde(default)]
    pub dependencies: HashMap<String, ContainerDescriptor>,

    /// Named environments: ordered raw "KEY=VALUE" lines. The reserved
    /// name "default" always applies first.
    #[serde(default)]
    pub environment: HashMap<String, Vec<String>>,

    /// Commands to run, in order, in the project directory
    #[serde(default)]
    pub commands: Vec<String>,

    /// Log files surfaced to the user; never executed
    #[serde(default, alias = "logfiles")]
    pub log_files: Vec<String>,
}

impl ExecSpec {
    /// Binding lines for a named environment; absent names yield nothing.
    pub fn bindings(&self, environment: &str) -> &[String] {
        self.environment
            .get(environment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One dependency container as declared in the manifest. Interpreted by the
/// service runtime; the orchestrator itself never looks inside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    /// Image reference (e.g. "postgres:15")
    pub image: String,

    /// Container ports to publish, as "container" or "host:container"
    #[serde(default)]
    pub ports: Vec<String>,

    /// Static environment passed to the container
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Mounts as "relative/dir:/container/path", resolved against the
    /// group work directory
    #[serde(default)]
    pub mounts: Vec<String>,

    /// Optional argv override for the container entrypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

impl ProjectManifest {
    pub fn validate(&self) -> Result<(), String> {
        if self.api_version != "runway.dev/v1" {
            return Err(format!(
                "Invalid apiVersion: expected 'runway.dev/v1', got '{}'",
                self.api_version
            ));
        }

        if self.kind != "ProjectManifest" {
            return Err(format!(
                "Invalid kind: expected 'ProjectManifest', got '{}'",
                self.kind
            ));
        }

        // Name format (DNS label: lowercase alphanumeric with hyphens)
        if self.metadata.name.is_empty() {
            return Err("metadata.name cannot be empty".to_string());
        }
        for ch in self.metadata.name.chars() {
            if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
                return Err(format!(
                    "Invalid metadata.name: '{}' must be lowercase alphanumeric with hyphens",
                    self.metadata.name
                ));
            }
        }
        if self.metadata.name.starts_with('-') || self.metadata.name.ends_with('-') {
            return Err(format!(
                "Invalid metadata.name: '{}' cannot start or end with hyphen",
                self.metadata.name
            ));
        }

        for (label, descriptor) in &self.spec.exec.dependencies {
            if label.is_empty() {
                return Err("dependency labels cannot be empty".to_string());
            }
            if descriptor.image.is_empty() {
                return Err(format!("dependency '{}' has no image", label));
            }
            for port in &descriptor.ports {
                let mut parts = port.split(':');
                let ok = match (parts.next(), parts.next(), parts.next()) {
                    (Some(c), None, None) => c.parse::<u16>().is_ok(),
                    (Some(h), Some(c), None) => {
                        h.parse::<u16>().is_ok() && c.parse::<u16>().is_ok()
                    }
                    _ => false,
                };
                if !ok {
                    return Err(format!(
                        "dependency '{}' has invalid port mapping '{}'",
                        label, port
                    ));
                }
            }
            for mount in &descriptor.mounts {
                if !mount.contains(':') {
                    return Err(format!(
                        "dependency '{}' has invalid mount '{}': expected 'dir:/container/path'",
                        label, mount
                    ));
                }
            }
        }

        Ok(())
    }
}
