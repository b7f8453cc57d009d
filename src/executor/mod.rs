//! Execution engine: backends that run caller-supplied code.
//!
//! Two backends implement [`Executor`]: a subprocess backend that runs code
//! directly on the host and a Docker backend that runs it in ephemeral
//! containers. Each call is a single, independent, stateless run; nothing
//! survives past the call boundary.

pub mod command;
pub mod docker;
pub mod profile;
pub mod subprocess;

pub use docker::DockerRunner;
pub use subprocess::HostRunner;

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::{ExecutionError, Result};

/// One execution call, parsed from the tool's flat string parameters.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    /// Raw source text. Never validated for syntax by the engine.
    pub code: String,
    /// Package names for the install step, in caller order. Installers may
    /// be order-sensitive for transitive pins, so the order is preserved.
    pub dependencies: Vec<String>,
    /// Environment variables merged over the inherited environment; caller
    /// keys win on conflict.
    pub env: HashMap<String, String>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

/// Captured output of a finished child process.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Exit code of the process (0 = success).
    pub exit_code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl ExecutionOutput {
    /// Combine stdout and stderr into the single text returned to callers.
    /// Content is never trimmed; the separator only appears when both
    /// streams are non-empty.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n--- stderr ---\n{}", self.stdout, self.stderr)
        }
    }
}

/// Trait for code execution backends.
///
/// Implementations block until the child process or container exits (or the
/// configured deadline kills it) and return the combined stdout/stderr text,
/// or a classified [`crate::error::ExecutionError`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute the request and return captured output.
    async fn execute(&self, request: ExecutionRequest) -> Result<String>;
}

/// Spawn `cmd`, optionally deliver a stdin payload, and capture stdout and
/// stderr concurrently under `timeout`. The child is killed if the deadline
/// fires. `name` labels errors with the owning profile.
pub(crate) async fn run_with_deadline(
    name: &str,
    mut cmd: Command,
    stdin_payload: Option<&str>,
    timeout: Duration,
) -> Result<ExecutionOutput> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    cmd.stdin(if stdin_payload.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| ExecutionError::infra(format!("Failed to spawn {program}"), &e))?;

    if let Some(code) = stdin_payload {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExecutionError::Infrastructure("Failed to open stdin".into()))?;
        stdin
            .write_all(code.as_bytes())
            .await
            .map_err(|e| ExecutionError::infra("Failed to write code to stdin", &e))?;
        drop(stdin); // Close stdin to signal EOF
    }

    // Take pipe handles out so `child` stays in scope for kill-on-timeout
    let mut child_stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecutionError::Infrastructure("Failed to open stdout".into()))?;
    let mut child_stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecutionError::Infrastructure("Failed to open stderr".into()))?;

    let read_all = async {
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let (r1, r2) = tokio::join!(
            child_stdout.read_to_end(&mut stdout_buf),
            child_stderr.read_to_end(&mut stderr_buf),
        );
        r1.map_err(|e| ExecutionError::infra("Failed to read stdout", &e))?;
        r2.map_err(|e| ExecutionError::infra("Failed to read stderr", &e))?;
        Ok::<_, ExecutionError>((stdout_buf, stderr_buf))
    };

    let (stdout_buf, stderr_buf) = if let Ok(result) = tokio::time::timeout(timeout, read_all).await
    {
        result?
    } else {
        let _ = child.kill().await;
        return Err(ExecutionError::Cancelled {
            name: name.to_string(),
            timeout_secs: timeout.as_secs(),
        });
    };

    let status = child
        .wait()
        .await
        .map_err(|e| ExecutionError::infra("Failed to wait for process", &e))?;

    Ok(ExecutionOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_stdout_only() {
        let out = ExecutionOutput {
            exit_code: 0,
            stdout: "hello\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(out.combined(), "hello\n");
    }

    #[test]
    fn combined_stderr_only() {
        let out = ExecutionOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: "boom".to_string(),
        };
        assert_eq!(out.combined(), "boom");
    }

    #[test]
    fn combined_both_streams() {
        let out = ExecutionOutput {
            exit_code: 0,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert_eq!(out.combined(), "out\n--- stderr ---\nerr");
    }

    #[test]
    fn request_builder_preserves_dependency_order() {
        let req = ExecutionRequest::new("print(1)")
            .with_dependencies(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(req.dependencies, vec!["b", "a"]);
    }
}
