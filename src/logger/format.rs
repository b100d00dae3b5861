//! Access log format module
//!
//! Supports multiple log formats:
//! - `dev` (default, `[19/Oct/2026 14:03:11] "GET / HTTP/1.1" 200 1234`)
//! - `common` (Common Log Format - CLF)
//! - `combined` (CLF plus referer and user agent)
//! - `json` (one JSON object per line)

use chrono::{DateTime, Local};
use std::str::FromStr;

/// Selected access log layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Dev,
    Common,
    Combined,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "common" => Ok(Self::Common),
            "combined" => Ok(Self::Combined),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown access log format '{other}' (expected dev, common, combined or json)"
            )),
        }
    }
}

/// One handled request, as reported to a [`crate::handler::RequestLogger`]
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Time the request was received
    pub time: DateTime<Local>,
    pub method: String,
    /// Request target including any query string
    pub uri: String,
    /// HTTP version (1.0, 1.1)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes (0 for HEAD)
    pub body_bytes: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry stamped with the current time
    pub fn new(remote_addr: String, method: String, uri: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            uri,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn format(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Dev => self.format_dev(),
            LogFormat::Common => self.format_common(),
            LogFormat::Combined => self.format_combined(),
            LogFormat::Json => self.format_json(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.uri, self.http_version)
    }

    fn format_dev(&self) -> String {
        format!(
            "[{}] \"{}\" {} {}",
            self.time.format("%d/%b/%Y %H:%M:%S"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "uri": self.uri,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }
}
