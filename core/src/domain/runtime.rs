use crate::domain::manifest::ContainerDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live handle to a running dependency container.
///
/// Owned by the orchestrator run that started it; the container itself
/// keeps running on the host after the run finishes unless provisioning
/// rolled it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHandle {
    pub id: ContainerId,
    pub label: String,
    /// Address at which the service is reachable from the host
    pub host: String,
    /// Container port -> published host port
    pub ports: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container runtime unavailable: {0}")]
    ClientUnavailable(String),
    #[error("could not create container work directory '{path}': {reason}")]
    WorkDir { path: String, reason: String },
    #[error("could not create service group '{group}': {reason}")]
    GroupSetup { group: String, reason: String },
    #[error("container '{label}' failed to start: {reason}")]
    StartFailed { label: String, reason: String },
    #[error("could not stop container '{label}': {reason}")]
    StopFailed { label: String, reason: String },
    #[error("dependency provisioning was cancelled")]
    Cancelled,
}

/// Entry point to a container runtime. Implementations must not touch the
/// runtime until `connect` is called: manifests without dependencies never
/// construct a client.
#[async_trait]
pub trait RuntimeConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ContainerRuntime>, RuntimeError>;
}

/// A connected container runtime client.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a named group context rooted at a working directory. All
    /// containers started through the group share its network and labels.
    async fn create_group(
        &self,
        group_id: &str,
        work_root: &Path,
    ) -> Result<Arc<dyn ServiceGroup>, RuntimeError>;
}

/// A service group: the scope that dependency containers are started in.
#[async_trait]
pub trait ServiceGroup: Send + Sync {
    async fn start_container(
        &self,
        label: &str,
        descriptor: &ContainerDescriptor,
    ) -> Result<ServiceHandle, RuntimeError>;

    async fn terminate(&self, handle: &ServiceHandle) -> Result<(), RuntimeError>;
}
