//! Property-Based Tests for the MCP server
//!
//! - **Robustness**: arbitrary input lines always produce a well-formed reply
//! - **Id echo**: numeric and string ids come back unchanged
//! - **Unknown methods**: always method-not-found, never a launch
//!
//! # Running the Tests
//!
//! ```bash
//! cargo test --lib mcp::proptests
//! ```

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::mcp::protocol::McpRequest;
use crate::mcp::server::test_support::server;
use crate::tools::testing::RecordingRunner;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// Helper: Generate JSON-RPC ids, numbers or strings
fn arb_id() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9-]{1,16}".prop_map(Value::String),
    ]
}

proptest! {
    /// Any input line gets exactly one reply carrying a result or an error
    #[test]
    fn prop_arbitrary_lines_never_panic(line in ".{0,200}") {
        let runner = Arc::new(RecordingRunner::new());
        let server = server(runner.clone());
        let reply = runtime().block_on(server.handle_message(&line));

        if let Some(reply) = reply {
            prop_assert_eq!(reply.jsonrpc.as_str(), "2.0");
            prop_assert!(reply.result.is_some() != reply.error.is_some());
        }
        prop_assert!(runner.specs().is_empty());
    }

    /// Ids are echoed verbatim
    #[test]
    fn prop_id_echoed(id in arb_id()) {
        let server = server(Arc::new(RecordingRunner::new()));
        let reply = runtime()
            .block_on(server.handle(McpRequest::new(id.clone(), "ping", None)))
            .unwrap();

        prop_assert_eq!(&reply.id, &id);
        prop_assert!(reply.is_success());
    }

    /// Unrecognized methods are rejected without touching any tool
    #[test]
    fn prop_unknown_methods_not_found(method in "[a-z]{1,8}/[a-z]{1,8}") {
        prop_assume!(method != "tools/list" && method != "tools/call");
        let runner = Arc::new(RecordingRunner::new());
        let server = server(runner.clone());
        let reply = runtime()
            .block_on(server.handle(McpRequest::new(1, method.as_str(), Some(json!({})))))
            .unwrap();

        prop_assert_eq!(reply.error.map(|e| e.code), Some(-32601));
        prop_assert!(runner.specs().is_empty());
    }
}
