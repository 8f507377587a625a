//! `aircrack_ng`: wireless operations from the aircrack-ng suite

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{find_output_flag, inject_output, CommandLine, ExitPolicy, Location, Report, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

pub const NAME: &str = "aircrack_ng";
pub const DESCRIPTION: &str =
    "Run an aircrack-ng suite operation on a wireless interface: monitor, scan, capture or crack.";

/// Caller flags that already set the capture file prefix
pub const WRITE_FLAGS: &[&str] = &["-w", "--write"];

/// Caller flags that already set the cracked-key file
pub const CRACK_OUTPUT_FLAGS: &[&str] = &["-o", "--output"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WirelessOperation {
    Monitor,
    Scan,
    Capture,
    Crack,
}

impl WirelessOperation {
    pub const ALL: [WirelessOperation; 4] = [Self::Monitor, Self::Scan, Self::Capture, Self::Crack];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Scan => "scan",
            Self::Capture => "capture",
            Self::Crack => "crack",
        }
    }
}

impl FromStr for WirelessOperation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ToolError::InvalidOperation {
                tool: "aircrack-ng",
                kind: "operation",
                name: s.to_string(),
            })
    }
}

impl fmt::Display for WirelessOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AircrackParams {
    pub interface: String,
    pub operation: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "interface": { "type": "string", "description": "Wireless interface name" },
            "operation": {
                "type": "string",
                "enum": WirelessOperation::ALL.map(WirelessOperation::as_str),
                "description": "Operation to perform",
            },
            "args": super::args_schema("Extra arguments for the underlying program"),
            "timeout": super::timeout_schema(1),
        },
        "required": ["interface", "operation"],
    })
}

pub fn build(
    params: &AircrackParams,
    operation: WirelessOperation,
    cx: &BuildContext<'_>,
) -> Invocation {
    let prefix = cx.artifact(&format!("aircrack_{operation}"), "");
    let prefix_str = prefix.display().to_string();
    let caller = params.args.iter().cloned();

    let (program, args, location) = match operation {
        WirelessOperation::Monitor => {
            let mut args = vec!["start".to_string(), params.interface.clone()];
            args.extend(caller);
            ("airmon-ng", args, Location::None)
        }
        WirelessOperation::Scan | WirelessOperation::Capture => {
            let program = if operation == WirelessOperation::Scan {
                "airodump-ng"
            } else {
                "aireplay-ng"
            };
            let mut args = vec![params.interface.clone()];
            let location = match find_output_flag(&params.args, WRITE_FLAGS) {
                Some(found) => Location::CallerSupplied(found.value),
                None => {
                    args.push("-w".to_string());
                    args.push(prefix_str.clone());
                    Location::Artifact(format!("{prefix_str}* files"))
                }
            };
            args.extend(caller);
            (program, args, location)
        }
        WirelessOperation::Crack => {
            let mut args: Vec<String> = caller.collect();
            let cracked = format!("{prefix_str}_cracked.txt");
            let location = match inject_output(&mut args, CRACK_OUTPUT_FLAGS, ["-o".to_string(), cracked]) {
                Some(found) => Location::CallerSupplied(found.value),
                None => Location::Artifact(format!("{prefix_str}* files")),
            };
            ("aircrack-ng", args, location)
        }
    };

    let timeout = cx
        .timeouts
        .resolve(ToolKind::AircrackNg.timeout_multiplier(), params.timeout);
    Invocation {
        // suite programs exit non-zero on interrupt even after useful work
        spec: cx.spec(CommandLine::argv(program, args), timeout, ExitPolicy::Ignore),
        location,
    }
}

pub async fn call(ctx: &ToolContext, params: AircrackParams) -> ToolReply {
    let operation = match params.operation.parse::<WirelessOperation>() {
        Ok(op) => op,
        Err(e) => return ToolReply::rejected(&e),
    };
    let invocation = build(&params, operation, &ctx.build_context());
    let report = Report::new(format!("Aircrack-ng {operation} operation"))
        .timeout_advice("Check the arguments or increase the timeout");
    super::run_and_render(ctx, invocation, report).await
}
