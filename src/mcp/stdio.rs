//! Newline-delimited JSON-RPC over stdin/stdout
//!
//! One message per line in each direction. Logs must go to stderr or a file
//! while this transport is active.

use super::server::McpServer;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serve requests read from `reader` until EOF, writing replies to `writer`
///
/// Requests are handled one at a time, in order.
pub async fn serve_lines<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);

        let Some(response) = server.handle_message(line).await else {
            continue;
        };
        let json = serde_json::to_string(&response).context("Failed to serialize response")?;
        writer
            .write_all(json.as_bytes())
            .await
            .context("Failed to write response")?;
        writer
            .write_all(b"\n")
            .await
            .context("Failed to write newline")?;
        writer.flush().await.context("Failed to flush stdout")?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// Serve over the process's own stdin/stdout
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    info!("Serving MCP over stdio");
    serve_lines(&server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::server::test_support::server;
    use crate::tools::testing::{success, RecordingRunner};
    use serde_json::Value;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_one_reply_per_request_line() {
        let runner = Arc::new(RecordingRunner::with_outcomes([success("hi\n")]));
        let server = server(runner);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"shell_command","arguments":{"command":"echo hi"}}}"#,
            "\n",
        );

        let mut output = Vec::new();
        serve_lines(&server, input.as_bytes(), &mut output).await.unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"]["content"][0]["text"], "hi\n");
    }

    #[tokio::test]
    async fn test_garbage_line_gets_parse_error() {
        let server = server(Arc::new(RecordingRunner::new()));
        let mut output = Vec::new();
        serve_lines(&server, "hello\n".as_bytes(), &mut output).await.unwrap();

        let reply: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(reply["error"]["code"], -32700);
    }
}
