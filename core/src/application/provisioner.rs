//! Dependency Provisioner
//!
//! Starts the project's declared dependency containers through the
//! container-runtime boundary and returns live handles keyed by label.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Manifest dependencies → running service handles
//! - **Dependencies:** Domain (RuntimeConnector, ServiceGroup)
//!
//! The runtime client is only constructed when at least one dependency is
//! declared. Containers start one at a time in map iteration order; on any
//! failure every container started so far is torn down best-effort before
//! the error propagates, so no partial table ever reaches the caller.

use crate::domain::manifest::ContainerDescriptor;
use crate::domain::runtime::{RuntimeConnector, RuntimeError, ServiceGroup, ServiceHandle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct DependencyProvisioner {
    connector: Arc<dyn RuntimeConnector>,
    group_id: String,
    work_root: PathBuf,
}

impl DependencyProvisioner {
    pub fn new(
        connector: Arc<dyn RuntimeConnector>,
        group_id: impl Into<String>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            connector,
            group_id: group_id.into(),
            work_root: work_root.into(),
        }
    }

    /// Start every declared dependency and return handles keyed by label.
    pub async fn start_all(
        &self,
        dependencies: &HashMap<String, ContainerDescriptor>,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, ServiceHandle>, RuntimeError> {
        if dependencies.is_empty() {
            return Ok(HashMap::new());
        }

        let runtime = self.connector.connect().await?;

        let work_dir = self.work_root.join("containers");
        std::fs::create_dir_all(&work_dir).map_err(|e| RuntimeError::WorkDir {
            path: work_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Will use {} as the dependency work dir", work_dir.display());

        let group = runtime.create_group(&self.group_id, &self.work_root).await?;

        info!("Starting {} dependencies...", dependencies.len());
        let mut containers: HashMap<String, ServiceHandle> = HashMap::new();
        for (label, descriptor) in dependencies {
            let started = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(RuntimeError::Cancelled),
                result = group.start_container(label, descriptor) => result,
            };
            match started {
                Ok(handle) => {
                    info!(label = %label, container = %handle.id, "Dependency started");
                    containers.insert(label.clone(), handle);
                }
                Err(e) => {
                    self.rollback(group.as_ref(), &containers).await;
                    return Err(e);
                }
            }
        }

        Ok(containers)
    }

    /// Best-effort teardown of already-started containers after a partial
    /// provisioning failure. Teardown errors are logged, never propagated:
    /// the original start failure is the one the caller needs to see.
    async fn rollback(
        &self,
        group: &dyn ServiceGroup,
        started: &HashMap<String, ServiceHandle>,
    ) {
        for (label, handle) in started {
            if let Err(e) = group.terminate(handle).await {
                warn!(label = %label, error = %e, "Could not tear down dependency after failed provisioning");
            }
        }
    }
}
