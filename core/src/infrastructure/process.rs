// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT
//! Process Command Runner
//!
//! Executes one external command to completion, streaming its combined
//! output live while retaining a buffered transcript for failure reporting.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements the process execution boundary behind
//!   `domain::command::CommandRunner`
//!
//! The command line is split on whitespace; no shell semantics. Each stream
//! gets its own drain task that copies every chunk to the console and to
//! the shared transcript until end-of-stream; the runner joins both tasks
//! after the child exits, so output is fully drained before the result is
//! reported. Cancellation or a deadline kills the child's whole process
//! group.

use crate::domain::command::{CommandError, CommandRunner, RunOptions};
use crate::domain::context::EnvMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::info;

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Kill the child's whole process group, then reap the child.
    async fn kill_group(child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            // The child was spawned as its own process group leader, so
            // the group id equals its pid.
            unsafe {
                libc::killpg(pid as i32, libc::SIGKILL);
            }
        }
        let _ = child.kill().await;
        let _ = child.wait().await;
    }

    fn exit_reason(status: ExitStatus) -> String {
        match status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

impl Default for ProcessCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a child stream to the console and the shared transcript until
/// end-of-stream.
async fn drain<R>(mut stream: R, transcript: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut console = tokio::io::stdout();
    let mut buf = [0u8; 8192];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = &buf[..n];
                let _ = console.write_all(chunk).await;
                let _ = console.flush().await;
                transcript.lock().extend_from_slice(chunk);
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(
        &self,
        command: &str,
        dir: &Path,
        env: &EnvMap,
        opts: &RunOptions,
    ) -> Result<(), CommandError> {
        info!("Running: {} in {}", command, dir.display());

        let mut tokens = command.split_whitespace();
        let program = tokens.next().ok_or_else(|| CommandError::StartFailed {
            command: command.to_string(),
            reason: "empty command line".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(tokens)
            .current_dir(dir)
            // The exported environment is layered over the inherited one
            // at spawn time; the process-wide table is never touched here.
            .envs(env.iter())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| CommandError::StartFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| CommandError::StartFailed {
            command: command.to_string(),
            reason: "stdout pipe missing".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| CommandError::StartFailed {
            command: command.to_string(),
            reason: "stderr pipe missing".to_string(),
        })?;

        let transcript = Arc::new(Mutex::new(Vec::new()));
        let out_task = tokio::spawn(drain(stdout, transcript.clone()));
        let err_task = tokio::spawn(drain(stderr, transcript.clone()));

        let deadline = async {
            match opts.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => WaitOutcome::Cancelled,
            _ = deadline => WaitOutcome::TimedOut,
            status = child.wait() => WaitOutcome::Exited(status),
        };

        if !matches!(outcome, WaitOutcome::Exited(_)) {
            Self::kill_group(&mut child).await;
        }

        // Completion barrier: both streams must hit end-of-stream before
        // any result is reported.
        let _ = out_task.await;
        let _ = err_task.await;

        let status = match outcome {
            WaitOutcome::Cancelled => {
                return Err(CommandError::Cancelled {
                    command: command.to_string(),
                })
            }
            WaitOutcome::TimedOut => {
                return Err(CommandError::TimedOut {
                    command: command.to_string(),
                    // The arm is only reachable with a deadline set.
                    timeout: opts.timeout.unwrap_or_default(),
                })
            }
            WaitOutcome::Exited(status) => status.map_err(|e| CommandError::Failed {
                command: command.to_string(),
                reason: format!("wait failed: {}", e),
            })?,
        };

        if !status.success() {
            let transcript = transcript.lock();
            eprintln!("Output:\n{}", String::from_utf8_lossy(&transcript));
            return Err(CommandError::Failed {
                command: command.to_string(),
                reason: Self::exit_reason(status),
            });
        }

        Ok(())
    }
}
