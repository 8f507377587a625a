//! Logging setup
//!
//! Two sinks: a stderr layer in the configured format, and an optional
//! plain-text file in the workspace log directory. stdout stays clean for the
//! stdio transport. `RUST_LOG` overrides the configured level.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process, otherwise
/// buffered file output is lost.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> Result<Option<WorkerGuard>> {
    let level: LevelFilter = config
        .level
        .to_lowercase()
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let mut layers: Vec<BoxedLayer<Registry>> = vec![format_layer(&config.format, std::io::stderr, true)];
    let guard = if config.log_to_file {
        let (writer, guard) = file_writer(log_dir, &config.log_file);
        layers.push(format_layer("compact", writer, false));
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Non-blocking writer appending to `{log_dir}/{file_name}`
pub fn file_writer(log_dir: &Path, file_name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::never(log_dir, file_name);
    tracing_appender::non_blocking(appender)
}

fn format_layer<S, W>(format: &str, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false);
    match format.to_lowercase().as_str() {
        "json" => layer.json().boxed(),
        "pretty" => layer.pretty().boxed(),
        _ => layer.compact().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing::{debug, info, info_span};

    #[test]
    fn test_file_sink_writes_to_log_dir() {
        let temp = TempDir::new().unwrap();
        let (writer, guard) = file_writer(temp.path(), "kali_mcp.log");
        let subscriber = tracing_subscriber::registry()
            .with(format_layer("compact", writer, false))
            .with(LevelFilter::INFO);

        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("tool_call", tool = "nmap_scan");
            let _enter = span.enter();
            info!(status = "success", "Tool call finished");
            debug!("filtered out");
        });
        drop(guard);

        let contents = std::fs::read_to_string(temp.path().join("kali_mcp.log")).unwrap();
        assert!(contents.contains("Tool call finished"));
        assert!(contents.contains("nmap_scan"));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn test_json_format_is_parseable() {
        let temp = TempDir::new().unwrap();
        let (writer, guard) = file_writer(temp.path(), "json.log");
        let subscriber = tracing_subscriber::registry().with(format_layer("json", writer, false));

        tracing::subscriber::with_default(subscriber, || {
            info!(port = 8010, "Listening");
        });
        drop(guard);

        let contents = std::fs::read_to_string(temp.path().join("json.log")).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["message"], "Listening");
        assert_eq!(line["fields"]["port"], 8010);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            ..LoggingConfig::default()
        };
        let temp = TempDir::new().unwrap();
        assert!(init(&config, temp.path()).is_err());
    }
}
