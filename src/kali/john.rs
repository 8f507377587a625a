//! `john_crack`: offline password cracking with John the Ripper
//!
//! Every run uses its own pot file so results from one call never leak into
//! another. After the crack finishes, or times out, a second short `--show`
//! run reads back whatever was cracked.

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{
    find_output_flag, CommandLine, ExecutionOutcome, ExecutionTimeout, ExitPolicy, InvocationSpec,
    Location, Report,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const NAME: &str = "john_crack";
pub const DESCRIPTION: &str =
    "Crack password hashes with John the Ripper, optionally with a wordlist. Returns cracked passwords.";

pub const OUTPUT_FLAGS: &[&str] = &["--pot"];

/// Upper bound for the `--show` read-back
pub const SHOW_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JohnParams {
    pub password_file: String,
    #[serde(default)]
    pub wordlist: Option<String>,
    #[serde(default)]
    pub john_args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "password_file": { "type": "string", "description": "File containing the password hashes" },
            "wordlist": { "type": "string", "description": "Optional wordlist path" },
            "john_args": super::args_schema("Extra john arguments"),
            "timeout": super::timeout_schema(ToolKind::JohnCrack.timeout_multiplier()),
        },
        "required": ["password_file"],
    })
}

/// Crack invocation plus the pot file in effect for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JohnPlan {
    pub invocation: Invocation,
    pub pot: String,
}

impl JohnPlan {
    /// `john --pot={pot} --show {password_file}`
    pub fn show_spec(&self, password_file: &str) -> InvocationSpec {
        let command = CommandLine::argv(
            "john",
            [format!("--pot={}", self.pot), "--show".to_string(), password_file.to_string()],
        );
        InvocationSpec::new(command, ExecutionTimeout::from_secs(SHOW_TIMEOUT_SECS), ExitPolicy::Ignore)
            .with_working_dir(self.invocation.spec.working_dir.clone())
    }

    fn show_command(&self, password_file: &str) -> String {
        format!("john --pot={} --show {}", self.pot, password_file)
    }
}

/// `john --pot={artifact} [--wordlist {wordlist}] {john_args..} {password_file}`
pub fn build(params: &JohnParams, cx: &BuildContext<'_>) -> JohnPlan {
    let mut args = Vec::new();
    let (pot, location) = match find_output_flag(&params.john_args, OUTPUT_FLAGS) {
        Some(caller) => {
            let pot = caller.value.clone().unwrap_or_default();
            (pot, Location::CallerSupplied(caller.value))
        }
        None => {
            let pot = cx.artifact("john_pot", "").display().to_string();
            args.push(format!("--pot={pot}"));
            (pot.clone(), Location::Artifact(pot))
        }
    };
    if let Some(ref wordlist) = params.wordlist {
        args.push("--wordlist".to_string());
        args.push(wordlist.clone());
    }
    args.extend(params.john_args.iter().cloned());
    args.push(params.password_file.clone());

    let timeout = cx
        .timeouts
        .resolve(ToolKind::JohnCrack.timeout_multiplier(), params.timeout);
    JohnPlan {
        invocation: Invocation {
            spec: cx.spec(CommandLine::argv("john", args), timeout, ExitPolicy::Check),
            location,
        },
        pot,
    }
}

async fn read_back(ctx: &ToolContext, plan: &JohnPlan, password_file: &str) -> Option<String> {
    let outcome = ctx.runner.run(&plan.show_spec(password_file)).await;
    match outcome {
        ExecutionOutcome::Success { stdout, .. } => Some(stdout),
        other => {
            warn!("john --show read-back failed: {}", other.status());
            None
        }
    }
}

pub async fn call(ctx: &ToolContext, params: JohnParams) -> ToolReply {
    let plan = build(&params, &ctx.build_context());
    let report = Report::new("John password cracking")
        .location(plan.invocation.location.clone())
        .read_back_heading("Cracked passwords");

    let outcome = ctx.runner.run(&plan.invocation.spec).await;
    match outcome {
        ExecutionOutcome::Success { .. } => {
            let mut text = report.render(&outcome).await;
            match read_back(ctx, &plan, &params.password_file).await {
                Some(cracked) => text.push_str(&format!("\n\nCracked passwords:\n{cracked}")),
                None => text.push_str(&format!(
                    "\n\nRun '{}' to view cracked passwords",
                    plan.show_command(&params.password_file)
                )),
            }
            ToolReply::from_outcome(text, &outcome)
        }
        ExecutionOutcome::TimedOut { .. } => {
            debug!("john timed out, reading back partial results from {}", plan.pot);
            let (outcome, report) = match read_back(ctx, &plan, &params.password_file).await {
                Some(cracked) => (outcome.with_read_back(Some(cracked)), report.partial_on_timeout()),
                None => {
                    let advice = format!(
                        "Run '{}' to view cracked passwords",
                        plan.show_command(&params.password_file)
                    );
                    (outcome, report.timeout_advice(advice))
                }
            };
            ToolReply::from_outcome(report.render(&outcome).await, &outcome)
        }
        _ => ToolReply::from_outcome(report.render(&outcome).await, &outcome),
    }
}
