// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT
//! Docker Service Runtime
//!
//! Implements the container-runtime boundary over the Docker API: a
//! versioned connection to the local daemon, a named service group backed
//! by a dedicated bridge network, and container start returning a handle
//! with queryable address/port attributes.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** `domain::runtime` traits → bollard
//!
//! Containers started here are labeled with their group and dependency
//! label so they can be found (and cleaned up) with plain `docker ps`
//! filters. They keep running after the run finishes; only a partial
//! provisioning failure tears them down.

use crate::domain::manifest::ContainerDescriptor;
use crate::domain::runtime::{
    ContainerId, ContainerRuntime, RuntimeConnector, RuntimeError, ServiceGroup, ServiceHandle,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions};
use bollard::service::{HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const GROUP_LABEL: &str = "build.runway.group";
const SERVICE_LABEL: &str = "build.runway.service";

/// Connects to the local Docker daemon on demand. Nothing is touched until
/// `connect` is called, so dependency-free projects never require Docker.
pub struct DockerConnector {
    socket_path: Option<String>,
}

impl DockerConnector {
    pub fn new(socket_path: Option<String>) -> Self {
        Self { socket_path }
    }
}

#[async_trait]
impl RuntimeConnector for DockerConnector {
    async fn connect(&self) -> Result<Arc<dyn ContainerRuntime>, RuntimeError> {
        let docker = if let Some(path) = &self.socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(path, 120, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(path, 120, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| {
                RuntimeError::ClientUnavailable(format!(
                    "could not connect to Docker at {}: {}",
                    path, e
                ))
            })?
        } else {
            Docker::connect_with_local_defaults()
                .map_err(|e| RuntimeError::ClientUnavailable(e.to_string()))?
        };

        // Verify the daemon actually answers before handing the client out.
        docker.ping().await.map_err(|e| {
            RuntimeError::ClientUnavailable(format!(
                "Docker daemon is not responding: {} (is Docker running?)",
                e
            ))
        })?;

        Ok(Arc::new(DockerRuntime { docker }))
    }
}

pub struct DockerRuntime {
    docker: Docker,
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create_group(
        &self,
        group_id: &str,
        work_root: &Path,
    ) -> Result<Arc<dyn ServiceGroup>, RuntimeError> {
        let network = format!("runway-{}", group_id);

        let exists = self
            .docker
            .inspect_network(&network, None::<InspectNetworkOptions<String>>)
            .await
            .is_ok();
        if !exists {
            let mut labels = HashMap::new();
            labels.insert(GROUP_LABEL.to_string(), group_id.to_string());
            self.docker
                .create_network(CreateNetworkOptions {
                    name: network.clone(),
                    check_duplicate: true,
                    labels,
                    ..Default::default()
                })
                .await
                .map_err(|e| RuntimeError::GroupSetup {
                    group: group_id.to_string(),
                    reason: e.to_string(),
                })?;
            info!(network = %network, "Created service group network");
        }

        Ok(Arc::new(DockerServiceGroup {
            docker: self.docker.clone(),
            group_id: group_id.to_string(),
            network,
            work_dir: work_root.join("containers"),
        }))
    }
}

pub struct DockerServiceGroup {
    docker: Docker,
    group_id: String,
    network: String,
    work_dir: PathBuf,
}

impl DockerServiceGroup {
    /// Pull the image only when it is not already present locally.
    async fn ensure_image(&self, label: &str, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }

        info!("Pulling image: {}", image);
        let options = Some(CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);
        while let Some(result) = stream.next().await {
            if let Err(e) = result {
                return Err(RuntimeError::StartFailed {
                    label: label.to_string(),
                    reason: format!("could not pull image {}: {}", image, e),
                });
            }
        }
        info!("Successfully pulled image: {}", image);
        Ok(())
    }

    /// Bind mount strings for the descriptor, with host sides resolved
    /// against this group's work directory and created up front.
    fn binds(&self, label: &str, descriptor: &ContainerDescriptor) -> Result<Vec<String>, RuntimeError> {
        let mut binds = Vec::new();
        for mount in &descriptor.mounts {
            let (host_rel, container_path) =
                mount.split_once(':').ok_or_else(|| RuntimeError::StartFailed {
                    label: label.to_string(),
                    reason: format!("invalid mount '{}'", mount),
                })?;
            let host_dir = self.work_dir.join(label).join(host_rel);
            std::fs::create_dir_all(&host_dir).map_err(|e| RuntimeError::WorkDir {
                path: host_dir.display().to_string(),
                reason: e.to_string(),
            })?;
            binds.push(format!("{}:{}", host_dir.display(), container_path));
        }
        Ok(binds)
    }

    fn port_config(
        descriptor: &ContainerDescriptor,
    ) -> (
        HashMap<String, HashMap<(), ()>>,
        HashMap<String, Option<Vec<PortBinding>>>,
    ) {
        let mut exposed = HashMap::new();
        let mut bindings = HashMap::new();
        for port in &descriptor.ports {
            let (host, container) = match port.split_once(':') {
                Some((host, container)) => (Some(host), container),
                None => (None, port.as_str()),
            };
            let key = format!("{}/tcp", container);
            exposed.insert(key.clone(), HashMap::new());
            if let Some(host_port) = host {
                bindings.insert(
                    key,
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: Some(host_port.to_string()),
                    }]),
                );
            }
        }
        (exposed, bindings)
    }
}

#[async_trait]
impl ServiceGroup for DockerServiceGroup {
    async fn start_container(
        &self,
        label: &str,
        descriptor: &ContainerDescriptor,
    ) -> Result<ServiceHandle, RuntimeError> {
        self.ensure_image(label, &descriptor.image).await?;

        let start_failed = |reason: String| RuntimeError::StartFailed {
            label: label.to_string(),
            reason,
        };

        let env_vars: Vec<String> = descriptor
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let mut labels = HashMap::new();
        labels.insert(GROUP_LABEL.to_string(), self.group_id.clone());
        labels.insert(SERVICE_LABEL.to_string(), label.to_string());

        let (exposed_ports, port_bindings) = Self::port_config(descriptor);
        let host_config = HostConfig {
            binds: Some(self.binds(label, descriptor)?),
            network_mode: Some(self.network.clone()),
            port_bindings: Some(port_bindings),
            // Ports without an explicit host side still get published to
            // an ephemeral port, queryable through the handle.
            publish_all_ports: Some(true),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: format!(
                "runway-{}-{}-{}",
                self.group_id,
                label,
                &uuid::Uuid::new_v4().to_string()[..8]
            ),
            platform: None,
        };

        let config = Config {
            image: Some(descriptor.image.clone()),
            cmd: descriptor.command.clone(),
            env: Some(env_vars),
            labels: Some(labels),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| start_failed(e.to_string()))?;
        let id = created.id;

        self.docker
            .start_container(&id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| start_failed(format!("could not start container: {}", e)))?;

        let inspect = self
            .docker
            .inspect_container(&id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| start_failed(format!("could not inspect container: {}", e)))?;

        let mut host = String::from("127.0.0.1");
        let mut ports = HashMap::new();
        if let Some(settings) = inspect.network_settings {
            if let Some(ip) = settings
                .networks
                .as_ref()
                .and_then(|networks| networks.get(&self.network))
                .and_then(|endpoint| endpoint.ip_address.clone())
                .filter(|ip| !ip.is_empty())
            {
                host = ip;
            } else if let Some(ip) = settings.ip_address.filter(|ip| !ip.is_empty()) {
                host = ip;
            }
            for (container_port, published) in settings.ports.unwrap_or_default() {
                let host_port = published
                    .and_then(|bindings| bindings.into_iter().next())
                    .and_then(|binding| binding.host_port);
                if let Some(host_port) = host_port {
                    // "5432/tcp" -> "5432"
                    let key = container_port
                        .split('/')
                        .next()
                        .unwrap_or(&container_port)
                        .to_string();
                    ports.insert(key, host_port);
                }
            }
        }

        info!(label = %label, container = %id, host = %host, "Started dependency container");

        Ok(ServiceHandle {
            id: ContainerId::new(id),
            label: label.to_string(),
            host,
            ports,
        })
    }

    async fn terminate(&self, handle: &ServiceHandle) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(handle.id.as_str(), Some(options))
            .await
            .map_err(|e| RuntimeError::StopFailed {
                label: handle.label.clone(),
                reason: e.to_string(),
            })?;

        info!(label = %handle.label, container = %handle.id, "Terminated dependency container");
        Ok(())
    }
}
