// Listener module
// Creates the TCP listener the dev server accepts on

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Create a bound, listening `TcpListener`.
///
/// `SO_REUSEADDR` is set on Unix so a restart is not blocked by sockets in
/// `TIME_WAIT`. `SO_REUSEPORT` stays off: a second server on
/// the same port must fail with `AddrInUse` instead of sharing it.
///
/// Must be called from within a Tokio runtime.
pub fn create_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_address(true)?;

    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
