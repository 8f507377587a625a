//! `metasploit_command`: run console commands through a resource script
//!
//! msfconsole output is spooled to a file rather than read from stdout, so
//! the reply body is that spool file.

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{Body, CommandLine, ExitPolicy, Location, Report, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::warn;

pub const NAME: &str = "metasploit_command";
pub const DESCRIPTION: &str =
    "Run a Metasploit console command non-interactively. Console output is spooled to a file in the scratch directory and returned.";

#[derive(Debug, Clone, Deserialize)]
pub struct MetasploitParams {
    pub msf_command: String,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "msf_command": { "type": "string", "description": "Command to run inside msfconsole" },
            "timeout": super::timeout_schema(1),
        },
        "required": ["msf_command"],
    })
}

/// A launch plus the resource script it needs on disk first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsfPlan {
    pub invocation: Invocation,
    pub resource_file: PathBuf,
    pub script: String,
    pub spool_file: PathBuf,
}

pub fn build(params: &MetasploitParams, cx: &BuildContext<'_>) -> MsfPlan {
    let resource_file = cx.artifact("msf_temp", ".rc");
    let spool_file = cx.artifact("msf_output", ".txt");
    let script = format!(
        "spool {}\n{}\nexit\n",
        spool_file.display(),
        params.msf_command
    );

    let timeout = cx
        .timeouts
        .resolve(ToolKind::MetasploitCommand.timeout_multiplier(), params.timeout);
    let command = CommandLine::argv(
        "msfconsole",
        ["-q".to_string(), "-r".to_string(), resource_file.display().to_string()],
    );

    MsfPlan {
        invocation: Invocation {
            // msfconsole's exit status says nothing about the command's result
            spec: cx.spec(command, timeout, ExitPolicy::Ignore),
            location: Location::artifact(&spool_file),
        },
        resource_file,
        script,
        spool_file,
    }
}

pub async fn call(ctx: &ToolContext, params: MetasploitParams) -> ToolReply {
    let plan = build(&params, &ctx.build_context());
    let report = Report::new("Metasploit command").body(Body::ArtifactFile(plan.spool_file.clone()));

    if let Err(e) = tokio::fs::write(&plan.resource_file, &plan.script).await {
        let err = ToolError::io(&plan.resource_file, e);
        warn!("Failed to write resource script: {}", err);
        return ToolReply::new(format!("{} error: {}", report.label(), err), "launch_error");
    }

    super::run_and_render(ctx, plan.invocation, report).await
}
