//! `burpsuite`: start Burp Suite in the background

use super::{ToolContext, ToolReply};
use crate::tools::ToolError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

pub const NAME: &str = "burpsuite";
pub const DESCRIPTION: &str =
    "Control Burp Suite. The only action is \"start\", which launches it in the background with output logged to a file.";

const PROGRAM: &str = "burpsuite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurpAction {
    Start,
}

impl FromStr for BurpAction {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            other => Err(ToolError::InvalidOperation {
                tool: "Burp Suite",
                kind: "action",
                name: other.to_string(),
            }),
        }
    }
}

fn default_action() -> String {
    "start".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BurpParams {
    #[serde(default = "default_action")]
    pub action: String,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "action": {
                "type": "string",
                "enum": ["start"],
                "default": "start",
                "description": "Action to perform",
            },
        },
    })
}

pub fn log_file(ctx: &ToolContext) -> PathBuf {
    let cx = ctx.build_context();
    cx.workspace.log_path("burpsuite", ".log", cx.timestamp)
}

/// Launches without waiting; the reply only confirms the spawn
pub async fn call(ctx: &ToolContext, params: BurpParams) -> ToolReply {
    let action = match params.action.parse::<BurpAction>() {
        Ok(action) => action,
        Err(e) => return ToolReply::rejected(&e),
    };

    match action {
        BurpAction::Start => {
            let log = log_file(ctx);
            match ctx.runner.spawn_detached(PROGRAM, &[], &log) {
                Ok(pid) => {
                    info!("Burp Suite started (pid {:?}), logging to {}", pid, log.display());
                    ToolReply::new(
                        format!("Burp Suite started in the background, log saved to {}", log.display()),
                        "success",
                    )
                }
                Err(e) => ToolReply::new(format!("Burp Suite operation error: {e}"), "launch_error"),
            }
        }
    }
}
