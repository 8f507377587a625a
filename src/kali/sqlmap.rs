//! `sqlmap_scan`: SQL injection testing against a URL

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{inject_output, CommandLine, ExitPolicy, Location, Report};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NAME: &str = "sqlmap_scan";
pub const DESCRIPTION: &str =
    "Run sqlmap SQL injection testing against a URL. Session data is written to an output directory in the scratch directory.";

pub const OUTPUT_FLAGS: &[&str] = &["-o", "--output-dir"];

#[derive(Debug, Clone, Deserialize)]
pub struct SqlmapParams {
    pub url: String,
    #[serde(default)]
    pub sqlmap_args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "description": "Target URL" },
            "sqlmap_args": super::args_schema("Extra sqlmap arguments"),
            "timeout": super::timeout_schema(ToolKind::SqlmapScan.timeout_multiplier()),
        },
        "required": ["url"],
    })
}

/// `sqlmap -u {url} {sqlmap_args..} [--output-dir {artifact}]`
pub fn build(params: &SqlmapParams, cx: &BuildContext<'_>) -> Invocation {
    let output_dir = cx.artifact("sqlmap_output", "");
    let mut extra = params.sqlmap_args.clone();
    let location = match inject_output(
        &mut extra,
        OUTPUT_FLAGS,
        ["--output-dir".to_string(), output_dir.display().to_string()],
    ) {
        Some(caller) => Location::CallerSupplied(caller.value),
        None => Location::artifact(&output_dir),
    };
    let mut args = vec!["-u".to_string(), params.url.clone()];
    args.extend(extra);

    let timeout = cx
        .timeouts
        .resolve(ToolKind::SqlmapScan.timeout_multiplier(), params.timeout);
    Invocation {
        spec: cx.spec(CommandLine::argv("sqlmap", args), timeout, ExitPolicy::Check),
        location,
    }
}

pub async fn call(ctx: &ToolContext, params: SqlmapParams) -> ToolReply {
    let invocation = build(&params, &ctx.build_context());
    super::run_and_render(ctx, invocation, Report::new("SQLMap scan").partial_on_timeout()).await
}
