//! MCP (Model Context Protocol) Server
//!
//! Exposes the Kali tool registry to MCP clients.
//!
//! # Architecture
//!
//! The implementation is organized into three layers:
//!
//! 1. **Protocol Layer** (`protocol`): JSON-RPC 2.0 message types
//! 2. **Server Layer** (`server`): method dispatch, independent of transport
//! 3. **Transport Layer** (`http`, `stdio`): HTTP + SSE via axum, and
//!    newline-delimited stdio

// Protocol layer: JSON-RPC 2.0 message types
pub mod protocol;

// Server layer: initialize, tools/list, tools/call
pub mod server;

// Transport layer
pub mod http;
pub mod stdio;

pub use protocol::{
    CallToolResult, Content, InitializeResult, McpError, McpMethod, McpRequest, McpResponse,
    ServerInfo, Tool, ToolCallParams,
};
pub use server::McpServer;

#[cfg(test)]
mod proptests;
