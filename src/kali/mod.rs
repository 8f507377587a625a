//! Kali Tool Catalog
//!
//! One module per wrapped security-testing program. Each module owns:
//!
//! - a typed parameter struct deserialized from the RPC arguments
//! - a pure `build` function mapping parameters to an [`Invocation`]
//! - an async `call` that runs the invocation and renders the reply
//! - its JSON input schema
//!
//! [`ToolKind`] is the closed set of tools; [`ToolRegistry`] dispatches
//! calls by name.

pub mod aircrack;
pub mod burpsuite;
pub mod hydra;
pub mod john;
pub mod metasploit;
pub mod nikto;
pub mod nmap;
pub mod registry;
pub mod shell;
pub mod sqlmap;
pub mod wpscan;

pub use registry::ToolRegistry;

use crate::mcp::protocol::Tool;
use crate::tools::{
    CommandLine, CommandRunner, ExecutionOutcome, ExecutionTimeout, ExitPolicy, InvocationSpec,
    Location, ToolError, TimeoutPolicy,
};
use crate::workspace::{unix_timestamp, Workspace};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Long-lived collaborators shared by every tool call
#[derive(Clone)]
pub struct ToolContext {
    pub workspace: Arc<Workspace>,
    pub runner: Arc<dyn CommandRunner>,
    pub timeouts: TimeoutPolicy,
    pub working_dir: Option<PathBuf>,
}

impl ToolContext {
    pub fn new(workspace: Arc<Workspace>, runner: Arc<dyn CommandRunner>, timeouts: TimeoutPolicy) -> Self {
        Self {
            workspace,
            runner,
            timeouts,
            working_dir: None,
        }
    }

    /// Directory child processes start in; `None` inherits the server's
    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Freeze the inputs for one call at the current second
    pub fn build_context(&self) -> BuildContext<'_> {
        BuildContext {
            workspace: &self.workspace,
            timeouts: self.timeouts,
            working_dir: self.working_dir.as_deref(),
            timestamp: unix_timestamp(),
        }
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("workspace", &self.workspace)
            .field("timeouts", &self.timeouts)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

/// Everything a command builder reads, fixed for one call
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub workspace: &'a Workspace,
    pub timeouts: TimeoutPolicy,
    pub working_dir: Option<&'a Path>,
    pub timestamp: i64,
}

impl BuildContext<'_> {
    pub fn artifact(&self, stem: &str, extension: &str) -> PathBuf {
        self.workspace.artifact_path(stem, extension, self.timestamp)
    }

    pub fn spec(&self, command: CommandLine, timeout: ExecutionTimeout, exit_policy: ExitPolicy) -> InvocationSpec {
        InvocationSpec::new(command, timeout, exit_policy)
            .with_working_dir(self.working_dir.map(Path::to_path_buf))
    }
}

/// A built command plus where its output is expected to land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub spec: InvocationSpec,
    pub location: Location,
}

/// Text reply for one tool call, plus a status label for logs and metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub status: &'static str,
}

impl ToolReply {
    pub fn new(text: impl Into<String>, status: &'static str) -> Self {
        Self {
            text: text.into(),
            status,
        }
    }

    pub fn from_outcome(text: String, outcome: &ExecutionOutcome) -> Self {
        Self::new(text, outcome.status())
    }

    /// Caller error caught before anything was launched
    pub fn rejected(err: &ToolError) -> Self {
        Self::new(err.to_string(), "invalid_operation")
    }
}

/// Run a built invocation and render it with `report`
async fn run_and_render(ctx: &ToolContext, invocation: Invocation, report: crate::tools::Report) -> ToolReply {
    let outcome = ctx.runner.run(&invocation.spec).await;
    let text = report.location(invocation.location).render(&outcome).await;
    ToolReply::from_outcome(text, &outcome)
}

/// The closed set of callable tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ShellCommand,
    NmapScan,
    MetasploitCommand,
    AircrackNg,
    Burpsuite,
    SqlmapScan,
    HydraAttack,
    NiktoScan,
    Wpscan,
    JohnCrack,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        Self::ShellCommand,
        Self::NmapScan,
        Self::MetasploitCommand,
        Self::AircrackNg,
        Self::Burpsuite,
        Self::SqlmapScan,
        Self::HydraAttack,
        Self::NiktoScan,
        Self::Wpscan,
        Self::JohnCrack,
    ];

    /// RPC-visible tool name
    pub fn name(self) -> &'static str {
        match self {
            Self::ShellCommand => shell::NAME,
            Self::NmapScan => nmap::NAME,
            Self::MetasploitCommand => metasploit::NAME,
            Self::AircrackNg => aircrack::NAME,
            Self::Burpsuite => burpsuite::NAME,
            Self::SqlmapScan => sqlmap::NAME,
            Self::HydraAttack => hydra::NAME,
            Self::NiktoScan => nikto::NAME,
            Self::Wpscan => wpscan::NAME,
            Self::JohnCrack => john::NAME,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ShellCommand => shell::DESCRIPTION,
            Self::NmapScan => nmap::DESCRIPTION,
            Self::MetasploitCommand => metasploit::DESCRIPTION,
            Self::AircrackNg => aircrack::DESCRIPTION,
            Self::Burpsuite => burpsuite::DESCRIPTION,
            Self::SqlmapScan => sqlmap::DESCRIPTION,
            Self::HydraAttack => hydra::DESCRIPTION,
            Self::NiktoScan => nikto::DESCRIPTION,
            Self::Wpscan => wpscan::DESCRIPTION,
            Self::JohnCrack => john::DESCRIPTION,
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            Self::ShellCommand => shell::input_schema(),
            Self::NmapScan => nmap::input_schema(),
            Self::MetasploitCommand => metasploit::input_schema(),
            Self::AircrackNg => aircrack::input_schema(),
            Self::Burpsuite => burpsuite::input_schema(),
            Self::SqlmapScan => sqlmap::input_schema(),
            Self::HydraAttack => hydra::input_schema(),
            Self::NiktoScan => nikto::input_schema(),
            Self::Wpscan => wpscan::input_schema(),
            Self::JohnCrack => john::input_schema(),
        }
    }

    /// Factor applied to the base timeout when the caller gives none
    pub fn timeout_multiplier(self) -> u32 {
        match self {
            Self::SqlmapScan | Self::JohnCrack => 2,
            Self::HydraAttack => 3,
            _ => 1,
        }
    }

    pub fn definition(self) -> Tool {
        Tool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema fragment shared by every tool's `timeout` parameter
fn timeout_schema(multiplier: u32) -> Value {
    let description = match multiplier {
        1 => "Execution timeout in seconds (defaults to the base timeout)".to_string(),
        n => format!("Execution timeout in seconds (defaults to {n}x the base timeout)"),
    };
    serde_json::json!({ "type": "integer", "minimum": 0, "description": description })
}

/// Schema fragment for an extra-argument list
fn args_schema(description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": { "type": "string" },
        "default": [],
        "description": description,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.name().parse::<ToolKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_tool() {
        let err = "hack_the_planet".parse::<ToolKind>().unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "hack_the_planet"));
    }

    #[test]
    fn test_timeout_multipliers() {
        assert_eq!(ToolKind::SqlmapScan.timeout_multiplier(), 2);
        assert_eq!(ToolKind::JohnCrack.timeout_multiplier(), 2);
        assert_eq!(ToolKind::HydraAttack.timeout_multiplier(), 3);
        assert_eq!(ToolKind::NmapScan.timeout_multiplier(), 1);
        assert_eq!(ToolKind::NiktoScan.timeout_multiplier(), 1);
        assert_eq!(ToolKind::Wpscan.timeout_multiplier(), 1);
    }

    #[test]
    fn test_every_schema_is_an_object() {
        for kind in ToolKind::ALL {
            let def = kind.definition();
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(!def.description.is_empty());
        }
    }
}
