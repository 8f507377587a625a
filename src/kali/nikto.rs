//! `nikto_scan`: web server vulnerability scan

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{inject_output, CommandLine, ExitPolicy, Location, Report};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NAME: &str = "nikto_scan";
pub const DESCRIPTION: &str = "Run a nikto web server vulnerability scan against a host or URL.";

pub const OUTPUT_FLAGS: &[&str] = &["-o", "-output"];

#[derive(Debug, Clone, Deserialize)]
pub struct NiktoParams {
    pub target: String,
    #[serde(default)]
    pub nikto_args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "target": { "type": "string", "description": "Target host or URL" },
            "nikto_args": super::args_schema("Extra nikto arguments"),
            "timeout": super::timeout_schema(1),
        },
        "required": ["target"],
    })
}

pub fn build(params: &NiktoParams, cx: &BuildContext<'_>) -> Invocation {
    let report = cx.artifact("nikto_scan", ".txt");
    let mut extra = params.nikto_args.clone();
    let location = match inject_output(&mut extra, OUTPUT_FLAGS, ["-o".to_string(), report.display().to_string()]) {
        Some(caller) => Location::CallerSupplied(caller.value),
        None => Location::artifact(&report),
    };
    let mut args = vec!["-h".to_string(), params.target.clone()];
    args.extend(extra);

    let timeout = cx
        .timeouts
        .resolve(ToolKind::NiktoScan.timeout_multiplier(), params.timeout);
    Invocation {
        spec: cx.spec(CommandLine::argv("nikto", args), timeout, ExitPolicy::Check),
        location,
    }
}

pub async fn call(ctx: &ToolContext, params: NiktoParams) -> ToolReply {
    let invocation = build(&params, &ctx.build_context());
    super::run_and_render(ctx, invocation, Report::new("Nikto scan").partial_on_timeout()).await
}
