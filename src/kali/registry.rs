//! Tool registry: name lookup, argument decoding and dispatch

use super::{
    aircrack, burpsuite, hydra, john, metasploit, nikto, nmap, shell, sqlmap, wpscan, ToolContext,
    ToolKind, ToolReply,
};
use crate::mcp::protocol::Tool;
use crate::metrics;
use crate::tools::ToolError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Dispatches tool calls against a shared [`ToolContext`]
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    ctx: ToolContext,
}

impl ToolRegistry {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Definitions for `tools/list`, in a stable order
    pub fn definitions(&self) -> Vec<Tool> {
        ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
    }

    /// Call a tool by name
    ///
    /// Errors only for an unknown name or arguments that do not match the
    /// tool's parameters. Everything that happens after launch, including
    /// failures, comes back as a [`ToolReply`].
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolReply, ToolError> {
        let kind: ToolKind = name.parse()?;
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        let span = info_span!("tool_call", tool = %kind);
        async move {
            let start = Instant::now();
            let reply = self.dispatch(kind, arguments).await?;
            let elapsed = start.elapsed();

            metrics::TOOL_CALLS_TOTAL
                .with_label_values(&[kind.name(), reply.status])
                .inc();
            metrics::TOOL_CALL_DURATION_SECONDS
                .with_label_values(&[kind.name()])
                .observe(elapsed.as_secs_f64());
            info!(status = reply.status, elapsed_ms = elapsed.as_millis() as u64, "Tool call finished");

            Ok(reply)
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, kind: ToolKind, arguments: Value) -> Result<ToolReply, ToolError> {
        let ctx = &self.ctx;
        let reply = match kind {
            ToolKind::ShellCommand => shell::call(ctx, parse(kind, arguments)?).await,
            ToolKind::NmapScan => nmap::call(ctx, parse(kind, arguments)?).await,
            ToolKind::MetasploitCommand => metasploit::call(ctx, parse(kind, arguments)?).await,
            ToolKind::AircrackNg => aircrack::call(ctx, parse(kind, arguments)?).await,
            ToolKind::Burpsuite => burpsuite::call(ctx, parse(kind, arguments)?).await,
            ToolKind::SqlmapScan => sqlmap::call(ctx, parse(kind, arguments)?).await,
            ToolKind::HydraAttack => hydra::call(ctx, parse(kind, arguments)?).await,
            ToolKind::NiktoScan => nikto::call(ctx, parse(kind, arguments)?).await,
            ToolKind::Wpscan => wpscan::call(ctx, parse(kind, arguments)?).await,
            ToolKind::JohnCrack => john::call(ctx, parse(kind, arguments)?).await,
        };
        Ok(reply)
    }
}

fn parse<T: DeserializeOwned>(kind: ToolKind, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name().to_string(),
        message: e.to_string(),
    })
}
