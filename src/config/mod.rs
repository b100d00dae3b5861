// Configuration module entry point
// Loads layered configuration: defaults, config file, environment, CLI overrides

mod types;

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig};

/// Values given on the command line, applied on top of every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<String>,
    pub directory_listing: Option<bool>,
    pub access_log: Option<bool>,
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error. Environment variables use the
    /// `DEVSERVER_` prefix with `__` between section and key, e.g.
    /// `DEVSERVER_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("site.root", defaults.site.root)?
            .set_default("site.events", defaults.site.events)?
            .set_default("http.server_name", defaults.http.server_name)?
            .set_default("http.index_files", defaults.http.index_files)?
            .set_default("http.directory_listing", defaults.http.directory_listing)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default("logging.access_log_format", defaults.logging.access_log_format)?
            .set_default(
                "performance.connection_timeout",
                i64::try_from(defaults.performance.connection_timeout).unwrap_or(i64::MAX),
            )?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DEVSERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("site.root", overrides.root.clone())?
            .set_override_option("http.directory_listing", overrides.directory_listing)?
            .set_override_option("logging.access_log", overrides.access_log)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        // Bare IPv6 literals need brackets to parse as a socket address
        let host = if self.server.host.contains(':') && !self.server.host.starts_with('[') {
            format!("[{}]", self.server.host)
        } else {
            self.server.host.clone()
        };
        format!("{host}:{}", self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address '{}:{}': {e}", self.server.host, self.server.port))
    }

    /// Absolute document root; relative roots resolve against the directory
    /// holding the executable, so the served tree does not depend on where
    /// the server was started from
    pub fn document_root(&self) -> io::Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let program_dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(root_relative_to(&self.site.root, program_dir))
    }
}

fn root_relative_to(root: &str, base: &Path) -> PathBuf {
    let root = Path::new(root);
    if root.is_absolute() {
        root.to_path_buf()
    } else {
        base.join(root)
    }
}
