// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Site layout: document root and the event folders announced at startup
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    /// Document root, relative paths resolve against the executable's directory
    pub root: String,
    /// Event folders printed as test URLs in the startup banner
    pub events: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: "docs".to_string(),
            events: ["hfestJ", "hfestM", "hfestOC", "hfestP", "hfestSM", "hfestW"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// HTTP behaviour configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub server_name: String,
    /// Files tried, in order, when a directory is requested
    pub index_files: Vec<String>,
    /// Render an HTML listing for directories without an index file
    pub directory_listing: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: concat!("verify-devserver/", env!("CARGO_PKG_VERSION")).to_string(),
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            directory_listing: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (dev, common, combined, json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            access_log_format: "dev".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Seconds a single connection may take before it is dropped, 0 disables
    pub connection_timeout: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            connection_timeout: 30,
        }
    }
}
