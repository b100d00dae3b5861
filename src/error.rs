//! Startup error types

use std::io;
use std::net::SocketAddr;

/// Errors that stop the server before (or instead of) serving
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("address already in use: {addr}")]
    AddrInUse { addr: SocketAddr },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServerError {
    /// Classify a bind failure, singling out the port-taken case
    pub fn from_bind(addr: SocketAddr, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AddrInUse {
            Self::AddrInUse { addr }
        } else {
            Self::Bind { addr, source }
        }
    }

    /// Operator-facing hint printed under the error message
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::AddrInUse { addr } => Some(format!(
                "Port {} is already in use. Try closing other applications or use a different port (--port).",
                addr.port()
            )),
            Self::Bind { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
                Some("Binding this port needs elevated privileges; pick a port above 1024.".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_in_use_classified() {
        let addr: SocketAddr = "127.0.0.1:8000".parse().unwrap();
        let err = ServerError::from_bind(addr, io::Error::from(io::ErrorKind::AddrInUse));
        assert!(matches!(err, ServerError::AddrInUse { .. }));
        assert!(err.to_string().contains("already in use"));
        assert!(err.hint().unwrap().contains("Port 8000"));
    }

    #[test]
    fn test_other_bind_errors_kept() {
        let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();
        let err = ServerError::from_bind(addr, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.hint().is_some());

        let err = ServerError::from_bind(addr, io::Error::from(io::ErrorKind::Other));
        assert!(err.hint().is_none());
    }
}
