//! `shell_command`: run an arbitrary shell string
//!
//! This is an operator-trust tool. The string goes to `sh -c` unescaped and
//! unvalidated, so anyone who can reach the RPC surface can run anything the
//! server user can.

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{Body, CommandLine, ExitPolicy, Location, Report};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NAME: &str = "shell_command";
pub const DESCRIPTION: &str =
    "Execute a shell command. Returns the command's stdout, or the error output on failure.";

#[derive(Debug, Clone, Deserialize)]
pub struct ShellCommandParams {
    pub command: String,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "command": { "type": "string", "description": "Shell command to execute" },
            "timeout": super::timeout_schema(1),
        },
        "required": ["command"],
    })
}

pub fn build(params: &ShellCommandParams, cx: &BuildContext<'_>) -> Invocation {
    let timeout = cx
        .timeouts
        .resolve(ToolKind::ShellCommand.timeout_multiplier(), params.timeout);
    Invocation {
        spec: cx.spec(CommandLine::Shell(params.command.clone()), timeout, ExitPolicy::Check),
        location: Location::None,
    }
}

pub async fn call(ctx: &ToolContext, params: ShellCommandParams) -> ToolReply {
    let invocation = build(&params, &ctx.build_context());
    super::run_and_render(ctx, invocation, Report::new("Command").body(Body::RawStdout)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kali::test_support::{build_context, context};
    use crate::tools::testing::{non_zero, success, timed_out, RecordingRunner};
    use crate::workspace::Workspace;
    use std::sync::Arc;

    #[test]
    fn test_build_passes_raw_string() {
        let ws = Workspace::new("/ws");
        let params = ShellCommandParams {
            command: "ls -la | grep x && id".into(),
            timeout: None,
        };
        let inv = build(&params, &build_context(&ws, 1));

        assert_eq!(inv.spec.command, CommandLine::Shell("ls -la | grep x && id".into()));
        assert_eq!(inv.spec.timeout.as_secs(), 600);
        assert_eq!(inv.spec.exit_policy, ExitPolicy::Check);
        assert_eq!(inv.location, Location::None);
    }

    #[tokio::test]
    async fn test_reply_is_raw_stdout() {
        let runner = Arc::new(RecordingRunner::with_outcomes([success("hi\n")]));
        let reply = call(
            &context(runner.clone()),
            ShellCommandParams {
                command: "echo hi".into(),
                timeout: Some(5),
            },
        )
        .await;

        assert_eq!(reply.text, "hi\n");
        assert_eq!(reply.status, "success");
        assert_eq!(runner.specs()[0].timeout.as_secs(), 5);
    }

    #[tokio::test]
    async fn test_timeout_and_failure_messages() {
        let runner = Arc::new(RecordingRunner::with_outcomes([
            timed_out(3),
            non_zero(2, "ls: cannot access 'nope'\n"),
        ]));
        let ctx = context(runner);
        let params = ShellCommandParams {
            command: "sleep 10".into(),
            timeout: Some(3),
        };

        let reply = call(&ctx, params.clone()).await;
        assert_eq!(reply.text, "Command timed out (exceeded 3 seconds)");

        let reply = call(&ctx, params).await;
        assert_eq!(reply.text, "Command error: ls: cannot access 'nope'\n");
        assert_eq!(reply.status, "non_zero_exit");
    }
}
