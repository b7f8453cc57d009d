//! code-exec-mcp library
//!
//! This crate provides the core functionality for the code-exec-mcp server:
//! - Execution engine with subprocess and Docker backends
//! - Static per-language execution profiles
//! - MCP server implementation using rmcp
//! - Tool parameter schemas and flat-string parsing

pub mod config;
pub mod error;
pub mod executor;
pub mod mcp;
pub mod tools;
