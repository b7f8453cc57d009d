//! code-exec-mcp server
//!
//! MCP server that runs Python, Bash, TypeScript, and Go code either as
//! host subprocesses or in ephemeral Docker containers. The execution mode
//! is fixed at startup via `--mode`.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use code_exec_mcp::config::{Config, ExecutionMode, DEFAULT_TIMEOUT_SECS};
use code_exec_mcp::mcp;

#[derive(Parser, Debug)]
#[command(name = "code-exec-mcp", version)]
#[command(about = "MCP server for multi-language code execution in subprocess or Docker isolation")]
struct Args {
    /// Run in stdio mode (for MCP clients)
    #[arg(long)]
    stdio: bool,

    /// Execution mode: subprocess or docker (unknown values fall back to subprocess)
    #[arg(long, default_value = "subprocess")]
    mode: String,

    /// Per-call execution deadline in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr so stdout is free for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new(
        ExecutionMode::from_flag(&args.mode),
        Duration::from_secs(args.timeout_seconds),
    );

    info!(
        mode = config.mode.as_str(),
        timeout_secs = args.timeout_seconds,
        "Loaded configuration"
    );

    if args.stdio {
        mcp::serve_stdio(config).await?;
    } else {
        anyhow::bail!("Only --stdio mode is currently supported");
    }

    Ok(())
}
