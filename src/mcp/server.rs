//! MCP request handling, independent of transport
//!
//! Every transport hands raw JSON-RPC text or parsed requests to
//! [`McpServer`] and writes back whatever response it returns.

use super::protocol::{
    CallToolResult, InitializeParams, InitializeResult, McpError, McpMethod, McpRequest,
    McpResponse, ServerInfo, ToolCallParams, JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::kali::ToolRegistry;
use crate::metrics;
use crate::tools::ToolError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name announced in `serverInfo`
pub const SERVER_NAME: &str = "kali_mcp";

/// Transport-agnostic MCP server
#[derive(Debug, Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Parse one JSON-RPC message and handle it
    ///
    /// Malformed JSON gets a parse error with a null id. Returns `None` for
    /// notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse JSON-RPC message: {}", e);
                return Some(McpResponse::err(Value::Null, McpError::parse_error(e.to_string())));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<McpRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(McpResponse::err(id, McpError::invalid_request(e.to_string()))),
        }
    }

    /// Handle one parsed request
    pub async fn handle(&self, request: McpRequest) -> Option<McpResponse> {
        let method = McpMethod::from(request.method.as_str());
        metrics::RPC_REQUESTS_TOTAL
            .with_label_values(&[metric_label(&method)])
            .inc();

        if request.jsonrpc != JSONRPC_VERSION {
            return request.id.map(|id| {
                McpResponse::err(
                    id,
                    McpError::invalid_request(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
                )
            });
        }

        let Some(id) = request.id else {
            debug!("Notification received: {}", request.method);
            return None;
        };

        let result = match method {
            McpMethod::Initialize => self.initialize(request.params),
            McpMethod::Ping => Ok(json!({})),
            McpMethod::ToolsList => Ok(json!({ "tools": self.registry.definitions() })),
            McpMethod::ToolsCall => self.call_tool(request.params).await,
            McpMethod::Initialized | McpMethod::Custom(_) => {
                Err(McpError::method_not_found(request.method))
            }
        };

        Some(match result {
            Ok(value) => McpResponse::ok(id, value),
            Err(error) => McpResponse::err(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        let protocol_version = match params {
            Some(params) => {
                let params: InitializeParams = serde_json::from_value(params)
                    .map_err(|e| McpError::invalid_params(format!("Invalid initialize params: {e}")))?;
                if let Some(ref client) = params.client_info {
                    info!("Client connected: {} {}", client.name, client.version);
                }
                params.protocol_version
            }
            None => PROTOCOL_VERSION.to_string(),
        };

        let result = InitializeResult {
            protocol_version,
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: ToolCallParams = params
            .ok_or_else(|| McpError::invalid_params("Missing tools/call params"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string()))
            })?;

        let result = match self.registry.call(&params.name, params.arguments).await {
            Ok(reply) => CallToolResult::text(reply.text),
            Err(ToolError::UnknownTool(name)) => {
                return Err(McpError::invalid_params(format!("Unknown tool: {name}")));
            }
            Err(e) => CallToolResult::error(e.to_string()),
        };
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }
}

/// Bounded label set so arbitrary method names cannot blow up cardinality
fn metric_label(method: &McpMethod) -> &str {
    match method {
        McpMethod::Custom(_) => "other",
        known => known.as_str(),
    }
}
