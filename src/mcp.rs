//! MCP server implementation using rmcp.
//!
//! One server type per execution mode. The subprocess server's tools take
//! no dependency parameter at all; the Docker server's tools do. Exactly
//! one server is constructed per process lifetime, chosen by the
//! configured execution mode.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use tracing::{error, info};

use crate::config::{Config, ExecutionMode, SERVER_NAME};
use crate::error::ExecutionError;
use crate::executor::{DockerRunner, Executor, HostRunner};
use crate::tools::{
    build_request, BashParams, GoParams, HostBashParams, HostGoParams, HostPythonParams,
    HostTypeScriptParams, PythonParams, TypeScriptParams,
};

/// Convert an engine outcome into a tool result. Errors become error-flagged
/// results, never handler failures, so one bad execution cannot take the
/// server down.
fn to_tool_result(outcome: Result<String, ExecutionError>) -> CallToolResult {
    match outcome {
        Ok(output) => CallToolResult::success(vec![Content::text(output)]),
        Err(e) => {
            error!(error = %e, "Execution failed");
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}

/// MCP server bound to the host subprocess backend.
#[derive(Clone)]
pub struct SubprocessServer<E: Clone> {
    python: Arc<E>,
    bash: Arc<E>,
    typescript: Arc<E>,
    go: Arc<E>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl<E: Executor + Clone + Send + Sync + 'static> SubprocessServer<E> {
    pub fn with_runners(python: E, bash: E, typescript: E, go: E) -> Self {
        Self {
            python: Arc::new(python),
            bash: Arc::new(bash),
            typescript: Arc::new(typescript),
            go: Arc::new(go),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "execute-python",
        description = "Execute Python code directly on the host system. Only standard library and pre-installed packages are available. Only output printed to stdout or stderr is returned so ALWAYS use print statements! Note: Code runs on the host system with user permissions."
    )]
    async fn execute_python(
        &self,
        Parameters(params): Parameters<HostPythonParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(&params.code, None, params.env.as_deref()) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.python.execute(request).await))
    }

    #[tool(
        name = "execute-bash",
        description = "Execute bash/shell commands directly on the host system. Only pre-installed system utilities are available. Only output printed to stdout or stderr is returned so make sure commands produce output! Note: Code runs on the host system with user permissions."
    )]
    async fn execute_bash(
        &self,
        Parameters(params): Parameters<HostBashParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(&params.script, None, params.env.as_deref()) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.bash.execute(request).await))
    }

    #[tool(
        name = "execute-typescript",
        description = "Execute TypeScript code directly on the host system using ts-node, tsx, or npx tsx. Only pre-installed packages are available. Only output printed to stdout or stderr is returned so ALWAYS use console.log statements! Note: Code runs on the host system with user permissions."
    )]
    async fn execute_typescript(
        &self,
        Parameters(params): Parameters<HostTypeScriptParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(&params.code, None, params.env.as_deref()) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.typescript.execute(request).await))
    }

    #[tool(
        name = "execute-go",
        description = "Execute Go code directly on the host system with go run. Only the standard library is available. Only output printed to stdout or stderr is returned so ALWAYS use fmt.Println statements! Your code must include a main package and main function. Note: Code runs on the host system with user permissions."
    )]
    async fn execute_go(
        &self,
        Parameters(params): Parameters<HostGoParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(&params.code, None, params.env.as_deref()) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.go.execute(request).await))
    }
}

impl SubprocessServer<HostRunner> {
    /// Bind the four host runners for the process lifetime.
    pub fn new(config: &Config) -> Self {
        Self::with_runners(
            HostRunner::python(config.timeout),
            HostRunner::bash(config.timeout),
            HostRunner::typescript(config.timeout),
            HostRunner::go(config.timeout),
        )
    }
}

#[tool_handler]
impl<E: Executor + Clone + Send + Sync + 'static> ServerHandler for SubprocessServer<E> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Execute Python, Bash, TypeScript, or Go code directly on the host system.\n\
                 Tools: execute-python, execute-bash, execute-typescript, execute-go.\n\
                 Dependency installation is not available in this mode; only \
                 pre-installed packages can be used. Each call is independent and \
                 stateless."
                    .to_string(),
            ),
        }
    }
}

/// MCP server bound to the Docker container backend.
#[derive(Clone)]
pub struct DockerServer<E: Clone> {
    python: Arc<E>,
    bash: Arc<E>,
    typescript: Arc<E>,
    go: Arc<E>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl<E: Executor + Clone + Send + Sync + 'static> DockerServer<E> {
    pub fn with_runners(python: E, bash: E, typescript: E, go: E) -> Self {
        Self {
            python: Arc::new(python),
            bash: Arc::new(bash),
            typescript: Arc::new(typescript),
            go: Arc::new(go),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "execute-python",
        description = "Execute Python code in an isolated Docker container. Playwright and headless browsers are pre-installed for web scraping. External modules can be dynamically installed. Only output printed to stdout or stderr is returned so ALWAYS use print statements! Note: Code runs in ephemeral containers - modules and state do NOT persist between executions."
    )]
    async fn execute_python(
        &self,
        Parameters(params): Parameters<PythonParams>,
    ) -> Result<CallToolResult, McpError> {
        let request =
            match build_request(&params.code, params.modules.as_deref(), params.env.as_deref()) {
                Ok(request) => request,
                Err(e) => return Ok(to_tool_result(Err(e))),
            };
        Ok(to_tool_result(self.python.execute(request).await))
    }

    #[tool(
        name = "execute-bash",
        description = "Execute bash/shell commands in an isolated Docker container (Ubuntu 22.04). System packages can be dynamically installed. Only output printed to stdout or stderr is returned so make sure commands produce output! Note: Code runs in ephemeral containers - files and state do NOT persist between executions."
    )]
    async fn execute_bash(
        &self,
        Parameters(params): Parameters<BashParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(
            &params.script,
            params.packages.as_deref(),
            params.env.as_deref(),
        ) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.bash.execute(request).await))
    }

    #[tool(
        name = "execute-typescript",
        description = "Execute TypeScript code in an isolated Docker container. External packages can be dynamically installed via npm. Only output printed to stdout or stderr is returned so ALWAYS use console.log statements! Note: Code runs in ephemeral containers - packages and state do NOT persist between executions."
    )]
    async fn execute_typescript(
        &self,
        Parameters(params): Parameters<TypeScriptParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(
            &params.code,
            params.packages.as_deref(),
            params.env.as_deref(),
        ) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.typescript.execute(request).await))
    }

    #[tool(
        name = "execute-go",
        description = "Execute Go code in an isolated Docker container. External packages can be dynamically installed via go get. Only output printed to stdout or stderr is returned so ALWAYS use fmt.Println statements! Your code must include a main package and main function. Note: Code runs in ephemeral containers - packages and state do NOT persist between executions."
    )]
    async fn execute_go(
        &self,
        Parameters(params): Parameters<GoParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(
            &params.code,
            params.packages.as_deref(),
            params.env.as_deref(),
        ) {
            Ok(request) => request,
            Err(e) => return Ok(to_tool_result(Err(e))),
        };
        Ok(to_tool_result(self.go.execute(request).await))
    }
}

impl DockerServer<DockerRunner> {
    /// Bind the four container runners for the process lifetime.
    pub fn new(config: &Config) -> Self {
        Self::with_runners(
            DockerRunner::python(config.timeout),
            DockerRunner::bash(config.timeout),
            DockerRunner::typescript(config.timeout),
            DockerRunner::go(config.timeout),
        )
    }
}

#[tool_handler]
impl<E: Executor + Clone + Send + Sync + 'static> ServerHandler for DockerServer<E> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Execute Python, Bash, TypeScript, or Go code in isolated Docker \
                 containers.\n\
                 Tools: execute-python, execute-bash, execute-typescript, execute-go.\n\
                 Dependencies can be installed per call via the modules/packages \
                 parameter. Containers are ephemeral; nothing persists between \
                 executions."
                    .to_string(),
            ),
        }
    }
}

/// Serve the mode-appropriate server over stdio.
pub async fn serve_stdio(config: Config) -> anyhow::Result<()> {
    info!(mode = config.mode.as_str(), "Starting MCP server on stdio");

    match config.mode {
        ExecutionMode::Subprocess => {
            let service = SubprocessServer::new(&config)
                .serve(stdio())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))?;
            service
                .waiting()
                .await
                .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;
        }
        ExecutionMode::Docker => {
            let service = DockerServer::new(&config)
                .serve(stdio())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))?;
            service
                .waiting()
                .await
                .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::executor::ExecutionRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every request it sees; replies with a canned outcome.
    #[derive(Clone, Default)]
    struct MockExecutor {
        seen: Arc<Mutex<Vec<ExecutionRequest>>>,
        fail: bool,
    }

    impl MockExecutor {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<ExecutionRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Executor for MockExecutor {
        async fn execute(&self, request: ExecutionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                Err(ExecutionError::Runtime {
                    name: "mock".to_string(),
                    exit_code: 1,
                    output: "boom".to_string(),
                })
            } else {
                Ok(format!("executed: {}", request.code))
            }
        }
    }

    fn subprocess_server(mock: MockExecutor) -> SubprocessServer<MockExecutor> {
        SubprocessServer::with_runners(mock.clone(), mock.clone(), mock.clone(), mock)
    }

    fn docker_server(mock: MockExecutor) -> DockerServer<MockExecutor> {
        DockerServer::with_runners(mock.clone(), mock.clone(), mock.clone(), mock)
    }

    #[tokio::test]
    async fn subprocess_python_success() {
        let mock = MockExecutor::default();
        let server = subprocess_server(mock.clone());
        let result = server
            .execute_python(Parameters(HostPythonParams {
                code: "print(1)".to_string(),
                env: None,
            }))
            .await
            .unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn subprocess_request_never_carries_dependencies() {
        let mock = MockExecutor::default();
        let server = subprocess_server(mock.clone());
        server
            .execute_bash(Parameters(HostBashParams {
                script: "echo hi".to_string(),
                env: Some("A=1".to_string()),
            }))
            .await
            .unwrap();
        let requests = mock.requests();
        assert!(requests[0].dependencies.is_empty());
        assert_eq!(requests[0].env["A"], "1");
    }

    #[tokio::test]
    async fn blank_code_is_rejected_before_execution() {
        let mock = MockExecutor::default();
        let server = subprocess_server(mock.clone());
        let result = server
            .execute_python(Parameters(HostPythonParams {
                code: "   ".to_string(),
                env: None,
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn runtime_error_becomes_error_result_not_handler_failure() {
        let server = subprocess_server(MockExecutor::failing());
        let result = server
            .execute_bash(Parameters(HostBashParams {
                script: "exit 1".to_string(),
                env: None,
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
    }

    #[tokio::test]
    async fn docker_python_parses_modules_in_order() {
        let mock = MockExecutor::default();
        let server = docker_server(mock.clone());
        let result = server
            .execute_python(Parameters(PythonParams {
                code: "import requests".to_string(),
                modules: Some("requests, pandas".to_string()),
                env: None,
            }))
            .await
            .unwrap();
        assert!(!result.is_error.unwrap_or(false));
        let requests = mock.requests();
        assert_eq!(requests[0].dependencies, vec!["requests", "pandas"]);
    }

    #[tokio::test]
    async fn docker_bash_parses_packages_and_env() {
        let mock = MockExecutor::default();
        let server = docker_server(mock.clone());
        server
            .execute_bash(Parameters(BashParams {
                script: "curl example.com".to_string(),
                packages: Some("curl".to_string()),
                env: Some("CONN=host=1;user=2".to_string()),
            }))
            .await
            .unwrap();
        let requests = mock.requests();
        assert_eq!(requests[0].dependencies, vec!["curl"]);
        assert_eq!(requests[0].env["CONN"], "host=1;user=2");
    }

    #[tokio::test]
    async fn empty_modules_string_matches_absent() {
        let mock = MockExecutor::default();
        let server = docker_server(mock.clone());
        server
            .execute_python(Parameters(PythonParams {
                code: "print(1)".to_string(),
                modules: Some(String::new()),
                env: None,
            }))
            .await
            .unwrap();
        server
            .execute_python(Parameters(PythonParams {
                code: "print(1)".to_string(),
                modules: None,
                env: None,
            }))
            .await
            .unwrap();
        let requests = mock.requests();
        assert_eq!(requests[0].dependencies, requests[1].dependencies);
        assert!(requests[0].dependencies.is_empty());
    }

    #[test]
    fn server_info_advertises_tools() {
        let server = subprocess_server(MockExecutor::default());
        let info = server.get_info();
        assert!(info.instructions.unwrap().contains("execute-python"));

        let server = docker_server(MockExecutor::default());
        let info = server.get_info();
        assert!(info.instructions.unwrap().contains("Docker"));
    }
}
