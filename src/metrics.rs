// Prometheus metrics for the kali-mcp server
//
// Exposed on the HTTP transport's /metrics endpoint:
// - Tool calls by tool and outcome (counter)
// - Tool call latency (histogram)
// - Running and timed-out child processes (gauge, counter)
// - RPC requests by method (counter)
// - Open SSE sessions (gauge)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    // Tool metrics
    pub static ref TOOL_CALLS_TOTAL: CounterVec = CounterVec::new(
        prometheus::Opts::new("tool_calls_total", "Total number of tool calls"),
        &["tool_name", "status"]
    ).expect("Failed to create tool calls metric");

    pub static ref TOOL_CALL_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new("tool_call_duration_seconds", "Duration of tool calls in seconds")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 300.0, 600.0, 1200.0, 1800.0]),
        &["tool_name"]
    ).expect("Failed to create tool call duration metric");

    // Process metrics
    pub static ref CHILD_PROCESSES_ACTIVE: IntGauge = IntGauge::new(
        "child_processes_active",
        "Number of child processes currently awaited"
    ).expect("Failed to create child processes metric");

    pub static ref CHILD_PROCESS_TIMEOUTS_TOTAL: IntCounter = IntCounter::new(
        "child_process_timeouts_total",
        "Total number of child processes killed on timeout"
    ).expect("Failed to create child process timeouts metric");

    pub static ref BACKGROUND_LAUNCHES_TOTAL: IntCounter = IntCounter::new(
        "background_launches_total",
        "Total number of detached background launches"
    ).expect("Failed to create background launches metric");

    // RPC metrics
    pub static ref RPC_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("rpc_requests_total", "Total number of JSON-RPC requests"),
        &["method"]
    ).expect("Failed to create RPC requests metric");

    pub static ref SSE_SESSIONS_ACTIVE: IntGauge = IntGauge::new(
        "sse_sessions_active",
        "Number of open SSE sessions"
    ).expect("Failed to create SSE sessions metric");
}

fn register<M>(metric: &M) -> prometheus::Result<()>
where
    M: prometheus::core::Collector + Clone + 'static,
{
    match REGISTRY.register(Box::new(metric.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Register every metric with [`REGISTRY`]; safe to call more than once
pub fn init() -> prometheus::Result<()> {
    register(&*TOOL_CALLS_TOTAL)?;
    register(&*TOOL_CALL_DURATION_SECONDS)?;
    register(&*CHILD_PROCESSES_ACTIVE)?;
    register(&*CHILD_PROCESS_TIMEOUTS_TOTAL)?;
    register(&*BACKGROUND_LAUNCHES_TOTAL)?;
    register(&*RPC_REQUESTS_TOTAL)?;
    register(&*SSE_SESSIONS_ACTIVE)?;
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init().unwrap();
        init().unwrap();
    }

    #[test]
    fn test_tool_metrics_exported() {
        init().unwrap();
        TOOL_CALLS_TOTAL
            .with_label_values(&["nmap_scan", "success"])
            .inc();
        TOOL_CALL_DURATION_SECONDS
            .with_label_values(&["nmap_scan"])
            .observe(0.25);

        let text = gather_metrics().unwrap();
        assert!(text.contains("tool_calls_total"));
        assert!(text.contains("tool_name=\"nmap_scan\""));
        assert!(text.contains("tool_call_duration_seconds_bucket"));
    }

    #[test]
    fn test_rpc_counter() {
        init().unwrap();
        let before = RPC_REQUESTS_TOTAL.with_label_values(&["ping"]).get();
        RPC_REQUESTS_TOTAL.with_label_values(&["ping"]).inc();
        assert_eq!(RPC_REQUESTS_TOTAL.with_label_values(&["ping"]).get(), before + 1);
    }
}
