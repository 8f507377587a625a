//! kali-mcp Library
//!
//! An MCP server that exposes Kali Linux security-testing programs as
//! callable tools. Each call builds a command line, runs it as a child
//! process under a timeout, and returns one text reply.

pub mod config;
pub mod kali;
pub mod logging;
pub mod mcp;
pub mod metrics;
pub mod tools;
pub mod workspace;

use crate::config::Config;
use crate::kali::{ToolContext, ToolRegistry};
use crate::mcp::McpServer;
use crate::tools::{ProcessRunner, TimeoutPolicy};
use crate::workspace::Workspace;
use std::sync::Arc;

/// Wire a server to real child processes according to `config`
pub fn build_server(config: &Config, workspace: Arc<Workspace>) -> McpServer {
    let ctx = ToolContext::new(
        workspace,
        Arc::new(ProcessRunner::new()),
        TimeoutPolicy::from_secs(config.tools.default_timeout_secs),
    )
    .with_working_dir(config.workspace.working_dir.clone());
    McpServer::new(ToolRegistry::new(ctx))
}
