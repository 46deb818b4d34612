// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

//! Integration tests for the execution orchestrator
//!
//! These tests drive the full sequencing pipeline:
//! 1. Parse a project manifest
//! 2. Provision dependencies (stub runtime)
//! 3. Expand the environment against the running handles
//! 4. Run commands, verifying ordering and fail-fast behavior

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use runway_core::application::orchestrator::{ExecOptions, ExecOrchestrator};
use runway_core::application::provisioner::DependencyProvisioner;
use runway_core::domain::command::{CommandError, CommandRunner, RunOptions};
use runway_core::domain::context::EnvMap;
use runway_core::domain::execution::ExecError;
use runway_core::domain::manifest::{ContainerDescriptor, ProjectManifest};
use runway_core::domain::runtime::{
    ContainerId, ContainerRuntime, RuntimeConnector, RuntimeError, ServiceGroup, ServiceHandle,
};
use runway_core::infrastructure::manifest_parser::ProjectManifestParser;
use runway_core::infrastructure::process::ProcessCommandRunner;

// ============================================================================
// Stub runtime
// ============================================================================

struct StubGroup {
    hosts: HashMap<String, String>,
}

#[async_trait]
impl ServiceGroup for StubGroup {
    async fn start_container(
        &self,
        label: &str,
        _descriptor: &ContainerDescriptor,
    ) -> Result<ServiceHandle, RuntimeError> {
        let host = self
            .hosts
            .get(label)
            .cloned()
            .unwrap_or_else(|| "172.18.0.9".to_string());
        Ok(ServiceHandle {
            id: ContainerId::new(format!("id-{label}")),
            label: label.to_string(),
            host,
            ports: HashMap::new(),
        })
    }

    async fn terminate(&self, _handle: &ServiceHandle) -> Result<(), RuntimeError> {
        Ok(())
    }
}

struct StubRuntime {
    group: Arc<StubGroup>,
}

#[async_trait]
impl ContainerRuntime for StubRuntime {
    async fn create_group(
        &self,
        _group_id: &str,
        _work_root: &Path,
    ) -> Result<Arc<dyn ServiceGroup>, RuntimeError> {
        Ok(self.group.clone())
    }
}

struct StubConnector {
    runtime: Arc<StubRuntime>,
    connects: Arc<AtomicUsize>,
}

#[async_trait]
impl RuntimeConnector for StubConnector {
    async fn connect(&self) -> Result<Arc<dyn ContainerRuntime>, RuntimeError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.runtime.clone())
    }
}

// ============================================================================
// Recording command runner
// ============================================================================

#[derive(Clone, Default)]
struct RecordingRunner {
    ran: Arc<Mutex<Vec<(String, EnvMap)>>>,
    fail_on: Option<String>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        command: &str,
        _dir: &Path,
        env: &EnvMap,
        _opts: &RunOptions,
    ) -> Result<(), CommandError> {
        self.ran.lock().push((command.to_string(), env.clone()));
        if self.fail_on.as_deref() == Some(command) {
            return Err(CommandError::Failed {
                command: command.to_string(),
                reason: "exit status 1".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn manifest(yaml: &str) -> ProjectManifest {
    ProjectManifestParser::parse_yaml(yaml).expect("manifest should parse")
}

struct Harness {
    orchestrator: ExecOrchestrator,
    ran: Arc<Mutex<Vec<(String, EnvMap)>>>,
    connects: Arc<AtomicUsize>,
    _work: tempfile::TempDir,
    project: tempfile::TempDir,
}

fn harness(hosts: &[(&str, &str)], fail_on: Option<&str>, options: ExecOptions) -> Harness {
    let work = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let group = Arc::new(StubGroup {
        hosts: hosts
            .iter()
            .map(|(label, host)| (label.to_string(), host.to_string()))
            .collect(),
    });
    let connects = Arc::new(AtomicUsize::new(0));
    let connector = Arc::new(StubConnector {
        runtime: Arc::new(StubRuntime { group }),
        connects: connects.clone(),
    });

    let runner = RecordingRunner {
        ran: Arc::new(Mutex::new(Vec::new())),
        fail_on: fail_on.map(String::from),
    };
    let ran = runner.ran.clone();

    let orchestrator = ExecOrchestrator::new(
        DependencyProvisioner::new(connector, "test", work.path()),
        Arc::new(runner),
        options,
    );

    Harness {
        orchestrator,
        ran,
        connects,
        _work: work,
        project,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_zero_dependencies_skip_runtime_entirely() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    commands:
      - build the-thing
"#,
    );
    let harness = harness(&[], None, ExecOptions::default());

    let report = harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap();

    assert_eq!(harness.connects.load(Ordering::SeqCst), 0);
    assert_eq!(report.commands_completed, 1);
}

#[tokio::test]
async fn test_commands_run_in_manifest_order() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    commands:
      - step one
      - step two
      - step three
"#,
    );
    let harness = harness(&[], None, ExecOptions::default());

    harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap();

    let ran: Vec<String> = harness.ran.lock().iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(ran, vec!["step one", "step two", "step three"]);
}

#[tokio::test]
async fn test_first_failure_stops_execution_and_names_the_command() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    commands:
      - step one
      - step two
      - step three
"#,
    );
    let harness = harness(&[], Some("step two"), ExecOptions::default());

    let err = harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap_err();

    match err {
        ExecError::Command(CommandError::Failed { command, .. }) => {
            assert_eq!(command, "step two")
        }
        other => panic!("expected command failure, got {other:?}"),
    }

    let ran: Vec<String> = harness.ran.lock().iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(ran, vec!["step one", "step two"]);
}

#[tokio::test]
async fn test_environment_resolves_from_running_dependency() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    dependencies:
      db:
        image: postgres:15
    environment:
      default:
        - DB_HOST={{db.host}}
    commands:
      - echo hello
"#,
    );
    let harness = harness(&[("db", "172.18.0.2")], None, ExecOptions::default());

    harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap();

    assert_eq!(harness.connects.load(Ordering::SeqCst), 1);
    let ran = harness.ran.lock();
    let (command, env) = &ran[0];
    assert_eq!(command, "echo hello");
    assert_eq!(env.get("DB_HOST"), Some("172.18.0.2"));
}

#[tokio::test]
async fn test_selected_environment_overrides_default() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    environment:
      default:
        - PORT=3000
        - HOST=localhost
      staging:
        - PORT=8080
    commands:
      - serve
"#,
    );
    let harness = harness(
        &[],
        None,
        ExecOptions {
            environment: "staging".to_string(),
            ..ExecOptions::default()
        },
    );

    harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap();

    let ran = harness.ran.lock();
    let (_, env) = &ran[0];
    assert_eq!(env.get("PORT"), Some("8080"));
    assert_eq!(env.get("HOST"), Some("localhost"));
}

#[tokio::test]
async fn test_malformed_bindings_are_skipped_not_fatal() {
    let manifest = manifest(
        r##"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    environment:
      default:
        - "# not a binding"
        - A=1
    commands:
      - serve
"##,
    );
    let harness = harness(&[], None, ExecOptions::default());

    harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap();

    let ran = harness.ran.lock();
    let (_, env) = &ran[0];
    assert_eq!(env.get("A"), Some("1"));
    assert_eq!(env.len(), 1);
}

#[tokio::test]
async fn test_unknown_template_label_fails_before_any_command() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    environment:
      default:
        - DB_HOST={{ghost.host}}
    commands:
      - serve
"#,
    );
    let harness = harness(&[], None, ExecOptions::default());

    let err = harness
        .orchestrator
        .run(&manifest, harness.project.path())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::Environment(_)));
    assert!(harness.ran.lock().is_empty());
}

#[tokio::test]
async fn test_missing_project_directory_is_a_setup_error() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    commands:
      - serve
"#,
    );
    let harness = harness(&[], None, ExecOptions::default());

    let err = harness
        .orchestrator
        .run(&manifest, Path::new("/definitely/not/a/real/dir"))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::Setup(_)));
}

// ============================================================================
// End-to-end with real processes
// ============================================================================

#[tokio::test]
async fn test_real_process_fail_fast() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    commands:
      - "false"
      - echo never
"#,
    );

    let work = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let connector = Arc::new(StubConnector {
        runtime: Arc::new(StubRuntime {
            group: Arc::new(StubGroup {
                hosts: HashMap::new(),
            }),
        }),
        connects: Arc::new(AtomicUsize::new(0)),
    });

    let orchestrator = ExecOrchestrator::new(
        DependencyProvisioner::new(connector, "test", work.path()),
        Arc::new(ProcessCommandRunner::new()),
        ExecOptions::default(),
    );

    let err = orchestrator.run(&manifest, project.path()).await.unwrap_err();

    match err {
        ExecError::Command(CommandError::Failed { command, .. }) => assert_eq!(command, "false"),
        other => panic!("expected command failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_real_process_success_reports_commands_completed() {
    let manifest = manifest(
        r#"
apiVersion: runway.dev/v1
kind: ProjectManifest
metadata:
  name: demo
spec:
  exec:
    environment:
      default:
        - RUNWAY_E2E_VAR=ok
    commands:
      - printenv RUNWAY_E2E_VAR
      - echo done
"#,
    );

    let work = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let connector = Arc::new(StubConnector {
        runtime: Arc::new(StubRuntime {
            group: Arc::new(StubGroup {
                hosts: HashMap::new(),
            }),
        }),
        connects: Arc::new(AtomicUsize::new(0)),
    });

    let orchestrator = ExecOrchestrator::new(
        DependencyProvisioner::new(connector, "test", work.path()),
        Arc::new(ProcessCommandRunner::new()),
        ExecOptions::default(),
    );

    let report = orchestrator.run(&manifest, project.path()).await.unwrap();
    assert_eq!(report.commands_completed, 2);
    assert!(report.ended_at.is_some());
}
