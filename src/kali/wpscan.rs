//! `wpscan`: WordPress vulnerability scan with a JSON report

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{inject_output, CommandLine, ExitPolicy, Location, Report};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NAME: &str = "wpscan";
pub const DESCRIPTION: &str =
    "Run a WPScan WordPress vulnerability scan against a site. The JSON report is saved in the scratch directory.";

pub const OUTPUT_FLAGS: &[&str] = &["-o", "--output"];

#[derive(Debug, Clone, Deserialize)]
pub struct WpscanParams {
    pub target: String,
    #[serde(default)]
    pub wpscan_args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "target": { "type": "string", "description": "WordPress site URL" },
            "wpscan_args": super::args_schema("Extra wpscan arguments"),
            "timeout": super::timeout_schema(1),
        },
        "required": ["target"],
    })
}

/// `wpscan --url {target} {wpscan_args..} [--output {artifact}.json --format json]`
pub fn build(params: &WpscanParams, cx: &BuildContext<'_>) -> Invocation {
    let report = cx.artifact("wpscan", ".json");
    let mut extra = params.wpscan_args.clone();
    let injection = [
        "--output".to_string(),
        report.display().to_string(),
        "--format".to_string(),
        "json".to_string(),
    ];
    let location = match inject_output(&mut extra, OUTPUT_FLAGS, injection) {
        Some(caller) => Location::CallerSupplied(caller.value),
        None => Location::artifact(&report),
    };
    let mut args = vec!["--url".to_string(), params.target.clone()];
    args.extend(extra);

    let timeout = cx
        .timeouts
        .resolve(ToolKind::Wpscan.timeout_multiplier(), params.timeout);
    Invocation {
        spec: cx.spec(CommandLine::argv("wpscan", args), timeout, ExitPolicy::Check),
        location,
    }
}

pub async fn call(ctx: &ToolContext, params: WpscanParams) -> ToolReply {
    let invocation = build(&params, &ctx.build_context());
    super::run_and_render(ctx, invocation, Report::new("WPScan scan").partial_on_timeout()).await
}
