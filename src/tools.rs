//! Tool parameter schemas and flat-string parsing.
//!
//! Each language has two parameter variants: the Docker-mode variant exposes
//! a dependency field (`modules` for Python, `packages` for the rest) and
//! the subprocess-mode variant omits it from the schema entirely. The unsafe
//! capability is structurally absent from the host-mode interface, not
//! merely unused.

use std::collections::HashMap;

use rmcp::schemars;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{ExecutionError, Result};
use crate::executor::ExecutionRequest;

/// Split a comma-separated dependency list. Every token is trimmed and
/// empty tokens are dropped; order is preserved.
pub fn parse_dependency_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse a comma-separated `KEY=VALUE` list. Each pair is split on the
/// first `=` only, so values may themselves contain `=`. Pairs without a
/// `=` or with an empty key are silently dropped; later duplicate keys
/// overwrite earlier ones. An empty input yields an empty map.
pub fn parse_env_list(input: &str) -> HashMap<String, String> {
    let mut env = HashMap::new();
    for pair in input.split(',') {
        let pair = pair.trim();
        if let Some((key, value)) = pair.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                env.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    env
}

/// Validate the code argument and assemble an [`ExecutionRequest`] from the
/// tool's flat string parameters.
pub fn build_request(
    code: &str,
    dependencies: Option<&str>,
    env: Option<&str>,
) -> Result<ExecutionRequest> {
    if code.trim().is_empty() {
        return Err(ExecutionError::Validation(
            "Missing or empty code argument".to_string(),
        ));
    }
    Ok(ExecutionRequest::new(code)
        .with_dependencies(parse_dependency_list(dependencies.unwrap_or_default()))
        .with_env(parse_env_list(env.unwrap_or_default())))
}

// --- Docker-mode parameters (dependency installation available) ---

/// Parameters for `execute-python` in Docker mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PythonParams {
    /// The Python code to execute.
    #[schemars(description = "The Python code to execute")]
    pub code: String,

    /// Modules installed via pip before the code runs.
    #[schemars(
        description = "Comma-separated list of Python modules to install (e.g., 'requests,beautifulsoup4,pandas'). Modules are installed automatically via pip before code execution."
    )]
    pub modules: Option<String>,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

/// Parameters for `execute-bash` in Docker mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct BashParams {
    /// The bash script or commands to execute.
    #[schemars(description = "The bash script or commands to execute")]
    pub script: String,

    /// Ubuntu packages installed via apt-get before the script runs.
    #[schemars(
        description = "Comma-separated list of Ubuntu packages to install (e.g., 'curl,jq,git'). Packages are installed automatically via apt-get before script execution."
    )]
    pub packages: Option<String>,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

/// Parameters for `execute-typescript` in Docker mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TypeScriptParams {
    /// The TypeScript code to execute.
    #[schemars(description = "The TypeScript code to execute")]
    pub code: String,

    /// Packages installed via npm before the code runs.
    #[schemars(
        description = "Comma-separated list of npm packages to install (e.g., 'axios,lodash'). Packages are installed automatically via npm before code execution."
    )]
    pub packages: Option<String>,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

/// Parameters for `execute-go` in Docker mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GoParams {
    /// The Go code to execute (must include package main and func main).
    #[schemars(description = "The Go code to execute (must include package main and func main)")]
    pub code: String,

    /// Packages installed via go get before the code runs.
    #[schemars(
        description = "Comma-separated list of Go packages to install (e.g., 'github.com/gorilla/mux'). Packages are installed automatically via go get before code execution."
    )]
    pub packages: Option<String>,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

// --- Subprocess-mode parameters (no dependency field in the schema) ---

/// Parameters for `execute-python` in subprocess mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HostPythonParams {
    /// The Python code to execute.
    #[schemars(description = "The Python code to execute")]
    pub code: String,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

/// Parameters for `execute-bash` in subprocess mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HostBashParams {
    /// The bash script or commands to execute.
    #[schemars(description = "The bash script or commands to execute")]
    pub script: String,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

/// Parameters for `execute-typescript` in subprocess mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HostTypeScriptParams {
    /// The TypeScript code to execute.
    #[schemars(description = "The TypeScript code to execute")]
    pub code: String,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

/// Parameters for `execute-go` in subprocess mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HostGoParams {
    /// The Go code to execute (must include package main and func main).
    #[schemars(description = "The Go code to execute (must include package main and func main)")]
    pub code: String,

    #[schemars(
        description = "Comma-separated list of environment variables in KEY=VALUE format (e.g., 'API_KEY=secret,DEBUG=true'). These will be available to your code."
    )]
    pub env: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_list_trims_every_token() {
        assert_eq!(
            parse_dependency_list("requests, beautifulsoup4 ,pandas"),
            vec!["requests", "beautifulsoup4", "pandas"]
        );
    }

    #[test]
    fn dependency_list_drops_empty_tokens() {
        assert_eq!(parse_dependency_list("curl,,jq, "), vec!["curl", "jq"]);
        assert!(parse_dependency_list("").is_empty());
        assert!(parse_dependency_list("  ").is_empty());
    }

    #[test]
    fn dependency_order_is_preserved() {
        assert_eq!(parse_dependency_list("z,a,m"), vec!["z", "a", "m"]);
    }

    #[test]
    fn env_list_basic_pairs() {
        let env = parse_env_list("K1=V1,K2=V2");
        assert_eq!(env.len(), 2);
        assert_eq!(env["K1"], "V1");
        assert_eq!(env["K2"], "V2");
    }

    #[test]
    fn env_value_may_contain_equals() {
        let env = parse_env_list("CONN=host=1;user=2");
        assert_eq!(env.len(), 1);
        assert_eq!(env["CONN"], "host=1;user=2");
    }

    #[test]
    fn env_pairs_without_equals_are_dropped() {
        let env = parse_env_list("PLAIN,K=V,ALSO_PLAIN");
        assert_eq!(env.len(), 1);
        assert_eq!(env["K"], "V");
    }

    #[test]
    fn env_empty_key_is_dropped() {
        let env = parse_env_list("=value,K=V");
        assert_eq!(env.len(), 1);
        assert!(env.contains_key("K"));
    }

    #[test]
    fn env_empty_input_is_empty_map() {
        assert!(parse_env_list("").is_empty());
    }

    #[test]
    fn env_later_duplicate_key_wins() {
        let env = parse_env_list("K=first,K=second");
        assert_eq!(env["K"], "second");
    }

    #[test]
    fn env_whitespace_is_trimmed_around_pair_key_and_value() {
        let env = parse_env_list("  DEBUG = true , API_KEY =secret ");
        assert_eq!(env["DEBUG"], "true");
        assert_eq!(env["API_KEY"], "secret");
    }

    #[test]
    fn build_request_rejects_blank_code() {
        let err = build_request("   ", None, None).unwrap_err();
        assert!(matches!(err, ExecutionError::Validation(_)));
    }

    #[test]
    fn build_request_empty_and_absent_dependencies_are_identical() {
        let absent = build_request("echo hi", None, None).unwrap();
        let empty = build_request("echo hi", Some(""), None).unwrap();
        assert_eq!(absent.dependencies, empty.dependencies);
        assert!(absent.dependencies.is_empty());
    }

    #[test]
    fn build_request_carries_parsed_parts() {
        let req = build_request("print(1)", Some("requests, pandas"), Some("A=1,B=2")).unwrap();
        assert_eq!(req.code, "print(1)");
        assert_eq!(req.dependencies, vec!["requests", "pandas"]);
        assert_eq!(req.env.len(), 2);
        assert_eq!(req.env["A"], "1");
    }
}
