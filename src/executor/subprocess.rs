//! Host subprocess backend.
//!
//! Runs code directly on the current machine as a child process. This is
//! the fast, low-isolation path. It never installs dependencies: the
//! profile type carries no install command, and a dependency list that
//! reaches this backend anyway is logged and ignored.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::profile::{HostInvocation, HostProfile};
use super::{run_with_deadline, ExecutionOutput, ExecutionRequest, Executor};
use crate::error::{ExecutionError, Result};

/// Backend that runs code as a host child process.
#[derive(Debug, Clone, Copy)]
pub struct HostRunner {
    profile: HostProfile,
    timeout: Duration,
}

impl HostRunner {
    pub const fn new(profile: HostProfile, timeout: Duration) -> Self {
        Self { profile, timeout }
    }

    pub const fn python(timeout: Duration) -> Self {
        Self::new(HostProfile::python(), timeout)
    }

    pub const fn bash(timeout: Duration) -> Self {
        Self::new(HostProfile::bash(), timeout)
    }

    pub const fn typescript(timeout: Duration) -> Self {
        Self::new(HostProfile::typescript(), timeout)
    }

    pub const fn go(timeout: Duration) -> Self {
        Self::new(HostProfile::go(), timeout)
    }

    pub const fn name(&self) -> &'static str {
        self.profile.name
    }

    fn into_result(&self, output: ExecutionOutput) -> Result<String> {
        debug!(exit_code = output.exit_code, "Execution completed");
        if output.exit_code == 0 {
            Ok(output.combined())
        } else {
            Err(ExecutionError::Runtime {
                name: self.profile.name.to_string(),
                exit_code: output.exit_code,
                output: output.combined(),
            })
        }
    }

    /// Pick the first candidate command whose program is on `PATH`.
    fn resolve_runtime(&self, candidates: &[&[&str]]) -> Result<Vec<String>> {
        for candidate in candidates {
            if which::which(candidate[0]).is_ok() {
                return Ok(candidate.iter().map(ToString::to_string).collect());
            }
        }
        let tried: Vec<&str> = candidates.iter().map(|c| c[0]).collect();
        Err(ExecutionError::Infrastructure(format!(
            "No runtime for {} found on PATH (tried: {})",
            self.profile.name,
            tried.join(", ")
        )))
    }
}

#[async_trait]
impl Executor for HostRunner {
    #[instrument(skip(self, request), fields(name = self.profile.name))]
    async fn execute(&self, request: ExecutionRequest) -> Result<String> {
        debug!(code_len = request.code.len(), "Starting subprocess execution");

        // Host execution never installs. A non-empty list can only come from
        // a caller bypassing the tool schema; it is dropped, not executed.
        if !request.dependencies.is_empty() {
            warn!(
                name = self.profile.name,
                dependencies = ?request.dependencies,
                "Dependency installation is not supported in subprocess mode, ignoring"
            );
        }

        match self.profile.invocation {
            HostInvocation::Stdin { binary } => {
                let mut cmd = Command::new(binary);
                cmd.envs(&request.env);
                let output =
                    run_with_deadline(self.profile.name, cmd, Some(&request.code), self.timeout)
                        .await?;
                self.into_result(output)
            }
            HostInvocation::SourceFile {
                file_name,
                candidates,
            } => {
                let runtime = self.resolve_runtime(candidates)?;

                // TempDir is removed on drop, on every exit path.
                let dir = tempfile::tempdir()
                    .map_err(|e| ExecutionError::infra("Failed to create temp directory", &e))?;
                let source = dir.path().join(file_name);
                tokio::fs::write(&source, &request.code)
                    .await
                    .map_err(|e| ExecutionError::infra("Failed to write source file", &e))?;

                let mut cmd = Command::new(&runtime[0]);
                cmd.args(&runtime[1..]).arg(&source).envs(&request.env);
                let output =
                    run_with_deadline(self.profile.name, cmd, None, self.timeout).await?;
                self.into_result(output)
            }
        }
    }
}
