//! Configuration handling for the SQL MCP Server.
//!
//! Settings come from CLI arguments with environment variable fallbacks. A `.env`
//! file in the working directory is loaded into the environment before parsing.

use crate::models::Credentials;
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_MYSQL_HOST: &str = "localhost";

// Pool configuration, fixed for every provisioned pool
pub const DEFAULT_POOL_CAPACITY: u32 = 5;
pub const DEFAULT_POOL_OVERFLOW: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECYCLE_SECS: u64 = 1800;

/// Sizing and lifetime settings applied to each provisioned pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Connections kept for reuse at steady state.
    pub capacity: u32,
    /// Extra transient connections allowed beyond `capacity`.
    pub overflow: u32,
    /// Maximum wait for a connection before acquisition fails.
    pub acquire_timeout: Duration,
    /// Maximum connection lifetime before it is closed and reopened.
    pub recycle: Duration,
}

impl PoolSettings {
    /// Hard ceiling on open connections (capacity + overflow).
    pub fn max_connections(&self) -> u32 {
        self.capacity.saturating_add(self.overflow)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            overflow: DEFAULT_POOL_OVERFLOW,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            recycle: Duration::from_secs(DEFAULT_RECYCLE_SECS),
        }
    }
}

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the SQL MCP Server.
#[derive(Clone, Parser)]
#[command(
    name = "sql-mcp-server",
    about = "MCP server with a transactional SQL execute tool for MySQL databases",
    version,
    author
)]
pub struct Config {
    /// MySQL user name
    #[arg(long, env = "MYSQL_USER")]
    pub mysql_user: Option<String>,

    /// MySQL password
    #[arg(long, env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub mysql_password: Option<String>,

    /// MySQL host, optionally with a port (host:port)
    #[arg(long, default_value = DEFAULT_MYSQL_HOST, env = "MYSQL_HOST")]
    pub mysql_host: String,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output (disabled by default to avoid interfering with stdio transport)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,
}

impl Config {
    /// Load `.env` (if present) and parse configuration from the command line.
    pub fn load() -> Self {
        // A missing or malformed .env is not an error; real env vars still apply.
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            mysql_user: None,
            mysql_password: None,
            mysql_host: DEFAULT_MYSQL_HOST.to_string(),
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
        }
    }

    /// Build the process-wide credentials from this configuration.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.mysql_user.clone(),
            self.mysql_password.clone(),
            self.mysql_host.clone(),
        )
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mysql_user", &self.mysql_user)
            .field("mysql_password", &self.mysql_password.as_ref().map(|_| "***"))
            .field("mysql_host", &self.mysql_host)
            .field("transport", &self.transport)
            .field("http_host", &self.http_host)
            .field("http_port", &self.http_port)
            .field("mcp_endpoint", &self.mcp_endpoint)
            .field("log_level", &self.log_level)
            .field("json_logs", &self.json_logs)
            .field("enable_logs", &self.enable_logs)
            .finish()
    }
}
