//! Error taxonomy for code execution.
//!
//! Every variant is surfaced to the MCP client as an error-flagged tool
//! result, never as a transport failure: a bad execution must not take the
//! server down with it.

use thiserror::Error;

/// Classified failure of a single execution call.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Required input missing or malformed. Rejected before anything runs.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The dependency install step exited non-zero. The run step was never
    /// attempted.
    #[error("{name}: dependency installation failed: {output}")]
    Install { name: String, output: String },

    /// The executed code itself exited non-zero. Expected outcome for bad
    /// user code.
    #[error("{name} exited with code {exit_code}: {output}")]
    Runtime {
        name: String,
        exit_code: i32,
        output: String,
    },

    /// The call exceeded its deadline and the child process was killed.
    #[error("{name} timed out after {timeout_secs}s")]
    Cancelled { name: String, timeout_secs: u64 },

    /// The execution mechanism itself failed: binary not found, docker
    /// daemon unreachable, image pull failure.
    #[error("Execution failed: {0}")]
    Infrastructure(String),
}

impl ExecutionError {
    /// Infrastructure error from a spawn/IO failure.
    pub fn infra(context: impl Into<String>, source: &dyn std::fmt::Display) -> Self {
        Self::Infrastructure(format!("{}: {source}", context.into()))
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
