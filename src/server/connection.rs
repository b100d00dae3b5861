// Connection module
// Serves a single TCP connection to completion

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::handler::{RequestLogger, StaticService};
use crate::logger;
use crate::resolver::PathResolver;

/// Serve one connection.
///
/// Keep-alive is off, so the connection carries a single request and closes;
/// a browser holding the socket open would otherwise stall the accept loop.
/// Errors are logged here and never reach the caller.
pub async fn serve_connection<R, L>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    service: Arc<StaticService<R, L>>,
    timeout: Option<Duration>,
) where
    R: PathResolver + 'static,
    L: RequestLogger + 'static,
{
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder.keep_alive(false);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            let service = Arc::clone(&service);
            async move { Ok::<_, Infallible>(service.handle(req, peer_addr).await) }
        }),
    );

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, conn).await {
            Ok(result) => result,
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    limit.as_secs()
                ));
                return;
            }
        },
        None => conn.await,
    };

    if let Err(err) = result {
        logger::log_connection_error(&peer_addr, &err);
    }
}
