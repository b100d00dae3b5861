//! Server module
//!
//! A sequential accept loop: each connection is served to completion before
//! the next one is accepted. The resolver and request logger are injected, so
//! tests can run several independently configured servers side by side.

mod connection;
mod listener;
pub mod signal;

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::{AccessLog, RequestLogger, StaticService};
use crate::logger::{self, LogFormat};
use crate::resolver::{CaseInsensitiveResolver, PathResolver};

pub use listener::create_listener;

/// A bound dev server, ready to run
pub struct DevServer<R = CaseInsensitiveResolver, L = AccessLog> {
    listener: TcpListener,
    service: Arc<StaticService<R, L>>,
    connection_timeout: Option<Duration>,
}

impl DevServer {
    /// Bind with the stock case-insensitive resolver and console access log.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let root = config.document_root()?;
        let format = config
            .logging
            .access_log_format
            .parse::<LogFormat>()
            .map_err(|e| ServerError::Config(config::ConfigError::Message(e)))?;
        let access_log = if config.logging.access_log {
            AccessLog::new(format)
        } else {
            AccessLog::disabled()
        };

        Self::with_components(config, CaseInsensitiveResolver::new(root), access_log)
    }
}

impl<R, L> DevServer<R, L>
where
    R: PathResolver + 'static,
    L: RequestLogger + 'static,
{
    /// Bind with caller-supplied path resolution and request logging
    pub fn with_components(
        config: &Config,
        resolver: R,
        request_logger: L,
    ) -> Result<Self, ServerError> {
        let addr = config
            .get_socket_addr()
            .map_err(ServerError::InvalidAddress)?;
        let listener = create_listener(addr).map_err(|e| ServerError::from_bind(addr, e))?;

        let timeout_secs = config.performance.connection_timeout;
        Ok(Self {
            listener,
            service: Arc::new(StaticService::new(
                resolver,
                request_logger,
                config.http.clone(),
            )),
            connection_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn document_root(&self) -> &Path {
        self.service.resolver().root()
    }

    /// Serve until SIGINT/SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(signal::shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves. The listener is closed on return.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,

                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                            continue;
                        }
                    };

                    let conn = connection::serve_connection(
                        stream,
                        peer_addr,
                        Arc::clone(&self.service),
                        self.connection_timeout,
                    );

                    // A stuck client must not keep Ctrl+C from working
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = conn => {}
                    }
                }
            }
        }

        Ok(())
    }
}
