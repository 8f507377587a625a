//! `hydra_attack`: online password attack against a network service

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{inject_output, CommandLine, ExitPolicy, Location, Report};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NAME: &str = "hydra_attack";
pub const DESCRIPTION: &str =
    "Run a hydra password attack against a network service using user and password lists.";

/// `-R` restores a previous session, whose output file is already set
pub const OUTPUT_FLAGS: &[&str] = &["-o", "-R"];

#[derive(Debug, Clone, Deserialize)]
pub struct HydraParams {
    pub target: String,
    pub service: String,
    pub userlist: String,
    pub passlist: String,
    #[serde(default)]
    pub additional_args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "target": { "type": "string", "description": "Target host" },
            "service": { "type": "string", "description": "Service to attack, e.g. ssh or ftp" },
            "userlist": { "type": "string", "description": "Path to the username list" },
            "passlist": { "type": "string", "description": "Path to the password list" },
            "additional_args": super::args_schema("Extra hydra arguments"),
            "timeout": super::timeout_schema(ToolKind::HydraAttack.timeout_multiplier()),
        },
        "required": ["target", "service", "userlist", "passlist"],
    })
}

/// `hydra -L {userlist} -P {passlist} {target} {service} {additional_args..} [-o {artifact}]`
pub fn build(params: &HydraParams, cx: &BuildContext<'_>) -> Invocation {
    let results = cx.artifact("hydra_results", ".txt");
    let mut extra = params.additional_args.clone();
    let location = match inject_output(
        &mut extra,
        OUTPUT_FLAGS,
        ["-o".to_string(), results.display().to_string()],
    ) {
        Some(caller) if caller.flag == "-o" => Location::CallerSupplied(caller.value),
        Some(_) => Location::CallerSupplied(None),
        None => Location::artifact(&results),
    };
    let mut args = vec![
        "-L".to_string(),
        params.userlist.clone(),
        "-P".to_string(),
        params.passlist.clone(),
        params.target.clone(),
        params.service.clone(),
    ];
    args.extend(extra);

    let timeout = cx
        .timeouts
        .resolve(ToolKind::HydraAttack.timeout_multiplier(), params.timeout);
    Invocation {
        spec: cx.spec(CommandLine::argv("hydra", args), timeout, ExitPolicy::Check),
        location,
    }
}

pub async fn call(ctx: &ToolContext, params: HydraParams) -> ToolReply {
    let invocation = build(&params, &ctx.build_context());
    super::run_and_render(ctx, invocation, Report::new("Hydra password attack").partial_on_timeout()).await
}
