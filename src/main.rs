// kali-mcp - Main Entry Point
//
// - CLI interface
// - Configuration and workspace setup
// - MCP server over HTTP/SSE or stdio
// - One-shot tool listing and calls

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kali_mcp::config::{Config, ConfigOverrides, Transport};
use kali_mcp::mcp::{http, stdio};
use kali_mcp::workspace::Workspace;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// kali-mcp: Kali Linux security tools over the Model Context Protocol
#[derive(Parser, Debug)]
#[command(name = "kali-mcp")]
#[command(version)]
#[command(about = "MCP server exposing Kali Linux security tools", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: {base-dir}/kali-mcp.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding tmp/ and log/ (default: the executable's directory)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (default)
    Serve {
        /// Listen address
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(long)]
        port: Option<u16>,

        /// Transport: http or stdio
        #[arg(long)]
        transport: Option<Transport>,
    },
    /// List the available tools
    ListTools,
    /// Call one tool and print its reply
    Call {
        /// Tool name, e.g. nmap_scan
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        arguments: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let mut overrides = ConfigOverrides {
        base_dir: args.base_dir.clone(),
        verbose: args.verbose,
        ..ConfigOverrides::default()
    };
    if let Some(Commands::Serve {
        ref host,
        port,
        transport,
    }) = args.command
    {
        overrides.host = host.clone();
        overrides.port = port;
        overrides.transport = transport;
    }

    let base_dir = args.base_dir.clone().unwrap_or_else(Workspace::default_base);
    let config = match args.config {
        Some(ref path) => Config::load_from_path(path)?,
        None => Config::load(&base_dir)?,
    }
    .apply_overrides(&overrides);
    config.validate()?;

    let workspace = Arc::new(Workspace::new(
        config.workspace.base_dir.clone().unwrap_or(base_dir),
    ));
    workspace.ensure_directories()?;

    // Initialize tracing; keep the guard so file output is flushed on exit
    let _log_guard = kali_mcp::logging::init(&config.logging, workspace.log_dir())?;

    info!("kali-mcp v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Workspace: {}", workspace.base_dir().display());

    let server = kali_mcp::build_server(&config, workspace);

    match args.command {
        None | Some(Commands::Serve { .. }) => match config.server.transport {
            Transport::Http => {
                let addr = config.listen_addr()?;
                http::serve(addr, server, config.metrics.enabled).await?;
            }
            Transport::Stdio => stdio::serve_stdio(server).await?,
        },
        Some(Commands::ListTools) => {
            for tool in server.registry().definitions() {
                println!("{:<20} {}", tool.name, tool.description);
            }
        }
        Some(Commands::Call { tool, arguments }) => {
            let arguments: Value =
                serde_json::from_str(&arguments).context("--arguments must be valid JSON")?;
            let reply = server.registry().call(&tool, arguments).await?;
            println!("{}", reply.text);
        }
    }

    Ok(())
}
