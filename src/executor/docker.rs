//! Docker container backend.
//!
//! Runs code inside a freshly created, auto-removed container. This is the
//! slow, high-isolation path and the only one that installs dependencies.
//! Each call gets its own container; nothing is reused between calls.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::command::{container_script, INSTALL_FAILURE_EXIT};
use super::profile::ContainerProfile;
use super::{run_with_deadline, ExecutionRequest, Executor};
use crate::error::{ExecutionError, Result};

/// Exit code `docker run` reserves for its own failures (daemon unreachable,
/// image pull failure, container could not start).
const DOCKER_RUN_FAILURE_EXIT: i32 = 125;

/// Backend that runs code in ephemeral Docker containers.
#[derive(Debug, Clone, Copy)]
pub struct DockerRunner {
    profile: ContainerProfile,
    timeout: Duration,
}

impl DockerRunner {
    pub const fn new(profile: ContainerProfile, timeout: Duration) -> Self {
        Self { profile, timeout }
    }

    pub const fn python(timeout: Duration) -> Self {
        Self::new(ContainerProfile::python(), timeout)
    }

    pub const fn bash(timeout: Duration) -> Self {
        Self::new(ContainerProfile::bash(), timeout)
    }

    pub const fn typescript(timeout: Duration) -> Self {
        Self::new(ContainerProfile::typescript(), timeout)
    }

    pub const fn go(timeout: Duration) -> Self {
        Self::new(ContainerProfile::go(), timeout)
    }

    pub const fn name(&self) -> &'static str {
        self.profile.name
    }

    /// Assemble the `docker run` invocation for one request.
    ///
    /// `--rm` removes the container on every exit path; `-i` keeps stdin
    /// open for the piped code. Environment variables are container-level
    /// `-e` flags, visible regardless of the inner shell's export semantics.
    fn build_command(&self, request: &ExecutionRequest, script: &str) -> Command {
        let mut cmd = Command::new("docker");
        cmd.args(["run", "--rm", "-i"]);
        for (key, value) in &request.env {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }
        cmd.arg(self.profile.image).args(["sh", "-c", script]);
        cmd
    }
}

#[async_trait]
impl Executor for DockerRunner {
    #[instrument(skip(self, request), fields(name = self.profile.name, image = self.profile.image))]
    async fn execute(&self, request: ExecutionRequest) -> Result<String> {
        let script = container_script(&self.profile, &request.dependencies);
        debug!(
            code_len = request.code.len(),
            script = %script,
            "Starting container execution"
        );

        let cmd = self.build_command(&request, &script);
        let output =
            run_with_deadline(self.profile.name, cmd, Some(&request.code), self.timeout).await?;

        debug!(exit_code = output.exit_code, "Container exited");

        match output.exit_code {
            0 => Ok(output.combined()),
            DOCKER_RUN_FAILURE_EXIT => Err(ExecutionError::Infrastructure(format!(
                "docker run failed for image {}: {}",
                self.profile.image,
                output.stderr.trim()
            ))),
            code if code == INSTALL_FAILURE_EXIT && !request.dependencies.is_empty() => {
                Err(ExecutionError::Install {
                    name: self.profile.name.to_string(),
                    output: output.combined(),
                })
            }
            code => Err(ExecutionError::Runtime {
                name: self.profile.name.to_string(),
                exit_code: code,
                output: output.combined(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docker_available() -> bool {
        // Container tests need a reachable daemon; opt in explicitly.
        std::env::var("CODE_EXEC_DOCKER_TEST").is_ok()
    }

    #[test]
    fn command_includes_env_flags_and_image() {
        let runner = DockerRunner::python(Duration::from_secs(30));
        let request = ExecutionRequest::new("print(1)").with_env(
            [("API_KEY".to_string(), "secret".to_string())]
                .into_iter()
                .collect(),
        );
        let script = container_script(&ContainerProfile::python(), &request.dependencies);
        let cmd = runner.build_command(&request, &script);

        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[..3], ["run", "--rm", "-i"]);
        assert!(args.contains(&"-e".to_string()));
        assert!(args.contains(&"API_KEY=secret".to_string()));
        assert!(args.contains(&"mcr.microsoft.com/playwright/python:v1.53.0-noble".to_string()));
        let sh = args.iter().position(|a| a == "sh").unwrap();
        assert_eq!(args[sh + 1], "-c");
        assert_eq!(args[sh + 2], "python");
    }

    #[test]
    fn command_script_carries_install_clause() {
        let runner = DockerRunner::python(Duration::from_secs(30));
        let request =
            ExecutionRequest::new("import requests").with_dependencies(vec!["requests".into()]);
        let script = container_script(&ContainerProfile::python(), &request.dependencies);
        let cmd = runner.build_command(&request, &script);

        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let script_arg = args.last().unwrap();
        assert!(script_arg.starts_with("python -m pip install --quiet requests"));
        assert!(script_arg.ends_with("&& python"));
    }

    #[tokio::test]
    async fn bash_container_echo() {
        if !docker_available() {
            return;
        }
        let runner = DockerRunner::bash(Duration::from_secs(120));
        let output = runner
            .execute(ExecutionRequest::new("echo hello"))
            .await
            .unwrap();
        assert_eq!(output, "hello\n");
    }

    #[tokio::test]
    async fn invalid_package_is_install_error_and_run_never_happens() {
        if !docker_available() {
            return;
        }
        let runner = DockerRunner::python(Duration::from_secs(300));
        let err = runner
            .execute(
                ExecutionRequest::new("print(\"should never appear\")")
                    .with_dependencies(vec!["definitely-not-a-real-pypi-package-xyz".into()]),
            )
            .await
            .unwrap_err();
        match err {
            ExecutionError::Install { output, .. } => {
                assert!(!output.contains("should never appear"));
            }
            other => panic!("expected Install error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_image_is_infrastructure_error() {
        if !docker_available() {
            return;
        }
        let profile = ContainerProfile {
            name: "broken",
            image: "code-exec-mcp-no-such-image:latest",
            install: None,
            run: &["true"],
        };
        let runner = DockerRunner::new(profile, Duration::from_secs(60));
        let err = runner
            .execute(ExecutionRequest::new("true"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Infrastructure(_)));
    }
}
