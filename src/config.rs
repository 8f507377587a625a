// Configuration File Support
//
// TOML configuration for the kali-mcp server. Every field has a default, so
// a missing file or a partial file is fine. Command-line flags override file
// values; there are no environment overrides besides RUST_LOG.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Config file looked up in the base directory when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "kali-mcp.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// RPC listener configuration
    pub server: ServerConfig,

    /// Scratch/log directory layout
    pub workspace: WorkspaceConfig,

    /// Tool execution defaults
    pub tools: ToolsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Which transport the server speaks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// HTTP with the SSE and POST /mcp endpoints
    #[default]
    Http,

    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

impl std::str::FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" | "sse" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            _ => anyhow::bail!("Invalid transport: {}. Must be one of: http, stdio", s),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Transport (http, stdio)
    pub transport: Transport,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8010,
            transport: Transport::Http,
        }
    }
}

/// Workspace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding `tmp/` and `log/`; defaults to the executable's directory
    pub base_dir: Option<PathBuf>,

    /// Working directory for child processes; defaults to the server's own
    pub working_dir: Option<PathBuf>,
}

/// Tool execution configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Base timeout in seconds; some tools scale it
    pub default_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: crate::tools::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,

    /// Whether to also log to a file in the log directory
    pub log_to_file: bool,

    /// Log file name inside the log directory
    pub log_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: "compact".to_string(),
            log_to_file: true,
            log_file: "kali_mcp.log".to_string(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to expose /metrics on the HTTP transport
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub transport: Option<Transport>,
    pub base_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    /// Load `{base_dir}/kali-mcp.toml`, or defaults if it does not exist
    pub fn load(base_dir: &Path) -> Result<Self> {
        Self::load_from_path(base_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed. If
    /// the file does not exist, returns defaults. Values are not validated
    /// here; call [`Config::validate`] once overrides are applied.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file from {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file from {:?}", path))?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(ref host) = overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(transport) = overrides.transport {
            self.server.transport = transport;
        }
        if let Some(ref base_dir) = overrides.base_dir {
            self.workspace.base_dir = Some(base_dir.clone());
        }
        if overrides.verbose {
            self.logging.level = "debug".to_string();
        }
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.logging.log_to_file && self.logging.log_file.trim().is_empty() {
            anyhow::bail!("Log file name must not be empty when log_to_file is enabled");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }
        self.server
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid server host: {}", self.server.host))?;

        if self.tools.default_timeout_secs == 0 {
            anyhow::bail!("Default tool timeout must be > 0");
        }

        Ok(())
    }

    /// Socket address for the HTTP transport
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid server host: {}", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
