//! Server configuration.
//!
//! The execution mode is chosen once at startup from the `--mode` flag and
//! fixed for the process lifetime. Unrecognized values fall back to
//! subprocess mode (the backend without install capability) rather than
//! silently enabling dependency installation.

use std::time::Duration;

use tracing::warn;

/// Server name advertised in the MCP handshake.
pub const SERVER_NAME: &str = "code-exec-mcp";

/// Default per-call deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Which execution backend the server binds at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run code directly on the host. No dependency installation.
    Subprocess,
    /// Run code in ephemeral Docker containers. Supports installation.
    Docker,
}

impl ExecutionMode {
    /// Parse the `--mode` flag value. Unknown values fall back to
    /// [`Self::Subprocess`] with a warning.
    pub fn from_flag(value: &str) -> Self {
        match value {
            "docker" => Self::Docker,
            "subprocess" => Self::Subprocess,
            other => {
                warn!(mode = %other, "Unknown execution mode, defaulting to subprocess");
                Self::Subprocess
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subprocess => "subprocess",
            Self::Docker => "docker",
        }
    }
}

/// Runtime configuration assembled from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Execution backend bound for the process lifetime.
    pub mode: ExecutionMode,
    /// Deadline applied to every execution call.
    pub timeout: Duration,
}

impl Config {
    pub const fn new(mode: ExecutionMode, timeout: Duration) -> Self {
        Self { mode, timeout }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Subprocess,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
