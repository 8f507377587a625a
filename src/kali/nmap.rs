//! `nmap_scan`: network scan with an XML report in the scratch directory

use super::{BuildContext, Invocation, ToolContext, ToolKind, ToolReply};
use crate::tools::{find_output_flag, CommandLine, ExitPolicy, Location, Report};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NAME: &str = "nmap_scan";
pub const DESCRIPTION: &str =
    "Run an nmap network scan against a host or network. The XML report is saved in the scratch directory.";

/// nmap flags that already name an output file
pub const OUTPUT_FLAGS: &[&str] = &["-oX", "-oN", "-oG", "-oA", "-oS"];

#[derive(Debug, Clone, Deserialize)]
pub struct NmapParams {
    pub target: String,
    #[serde(default)]
    pub nmap_args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "target": { "type": "string", "description": "Target host or network address" },
            "nmap_args": super::args_schema("Extra nmap arguments"),
            "timeout": super::timeout_schema(1),
        },
        "required": ["target"],
    })
}

/// `nmap -oX {artifact}.xml {nmap_args..} {target}`
///
/// The `-oX` pair is omitted when the caller passes their own output flag.
pub fn build(params: &NmapParams, cx: &BuildContext<'_>) -> Invocation {
    let mut args = Vec::with_capacity(params.nmap_args.len() + 3);
    let location = match find_output_flag(&params.nmap_args, OUTPUT_FLAGS) {
        Some(caller) => Location::CallerSupplied(caller.value),
        None => {
            let report = cx.artifact("nmap_scan", ".xml");
            args.push("-oX".to_string());
            args.push(report.display().to_string());
            Location::artifact(report)
        }
    };
    args.extend(params.nmap_args.iter().cloned());
    args.push(params.target.clone());

    let timeout = cx
        .timeouts
        .resolve(ToolKind::NmapScan.timeout_multiplier(), params.timeout);
    Invocation {
        spec: cx.spec(CommandLine::argv("nmap", args), timeout, ExitPolicy::Check),
        location,
    }
}

pub async fn call(ctx: &ToolContext, params: NmapParams) -> ToolReply {
    let invocation = build(&params, &ctx.build_context());
    let report = Report::new("Nmap scan")
        .timeout_advice("Check the scan arguments or increase the timeout");
    super::run_and_render(ctx, invocation, report).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kali::test_support::{argv, build_context, context, strings};
    use crate::tools::testing::{non_zero, success, timed_out, RecordingRunner};
    use crate::workspace::Workspace;
    use std::sync::Arc;

    #[test]
    fn test_argument_shape() {
        let ws = Workspace::new("/ws");
        let params = NmapParams {
            target: "10.0.0.5".into(),
            nmap_args: strings(&["-sV", "-p", "22,80"]),
            timeout: None,
        };
        let inv = build(&params, &build_context(&ws, 1700000000));

        let (program, args) = argv(&inv.spec);
        assert_eq!(program, "nmap");
        assert_eq!(
            args,
            strings(&["-oX", "/ws/tmp/nmap_scan_1700000000.xml", "-sV", "-p", "22,80", "10.0.0.5"])
        );
        assert_eq!(inv.location, Location::Artifact("/ws/tmp/nmap_scan_1700000000.xml".into()));
    }

    #[test]
    fn test_caller_output_flag_not_duplicated() {
        let ws = Workspace::new("/ws");
        let params = NmapParams {
            target: "10.0.0.0/24".into(),
            nmap_args: strings(&["-oN", "/reports/net.txt"]),
            timeout: None,
        };
        let inv = build(&params, &build_context(&ws, 1));

        let (_, args) = argv(&inv.spec);
        assert_eq!(args, strings(&["-oN", "/reports/net.txt", "10.0.0.0/24"]));
        assert_eq!(inv.location, Location::CallerSupplied(Some("/reports/net.txt".into())));
    }

    #[test]
    fn test_fresh_argument_list_per_call() {
        let ws = Workspace::new("/ws");
        let params = NmapParams {
            target: "h".into(),
            nmap_args: Vec::new(),
            timeout: None,
        };
        let first = build(&params, &build_context(&ws, 1));
        let second = build(&params, &build_context(&ws, 2));

        assert_eq!(argv(&first.spec).1.len(), 3);
        assert_eq!(argv(&second.spec).1.len(), 3);
        assert!(params.nmap_args.is_empty());
    }

    #[tokio::test]
    async fn test_unresponsive_target_times_out() {
        let runner = Arc::new(RecordingRunner::with_outcomes([timed_out(5)]));
        let reply = call(
            &context(runner.clone()),
            NmapParams {
                target: "10.0.0.5".into(),
                nmap_args: Vec::new(),
                timeout: Some(5),
            },
        )
        .await;

        assert!(reply.text.contains("timed out"));
        assert!(reply.text.contains('5'));
        assert_eq!(reply.status, "timeout");
        assert_eq!(runner.specs()[0].timeout.as_secs(), 5);
    }

    #[tokio::test]
    async fn test_success_and_failure_replies() {
        let runner = Arc::new(RecordingRunner::with_outcomes([
            success("Nmap done: 1 IP address (1 host up)\n"),
            non_zero(1, "Failed to resolve \"nohost\".\n"),
        ]));
        let ctx = context(runner);
        let params = NmapParams {
            target: "scanme.nmap.org".into(),
            nmap_args: Vec::new(),
            timeout: None,
        };

        let reply = call(&ctx, params.clone()).await;
        assert!(reply.text.starts_with("Nmap scan completed, output saved to /ws/tmp/nmap_scan_"));
        assert!(reply.text.ends_with("\n\nNmap done: 1 IP address (1 host up)\n"));

        let reply = call(&ctx, params).await;
        assert_eq!(reply.text, "Nmap scan error: Failed to resolve \"nohost\".\n");
    }
}
