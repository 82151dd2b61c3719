// Network module
// Tuned TCP listener and the HTTP serve loop with graceful shutdown

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Socket options applied before binding
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Disable Nagle's algorithm
    pub tcp_nodelay: bool,

    /// Enable SO_REUSEADDR so restarts don't wait on TIME_WAIT
    pub so_reuseaddr: bool,

    /// Pending connection queue length
    pub backlog: i32,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            so_reuseaddr: true,
            backlog: 1024,
        }
    }
}

/// Create a bound, listening TCP socket and hand it to tokio
pub fn bind_listener(addr: &SocketAddr, options: &SocketOptions) -> Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    if options.so_reuseaddr {
        socket.set_reuse_address(true)?;
    }
    socket.set_nodelay(options.tcp_nodelay)?;
    socket.set_keepalive(true)?;

    socket
        .bind(&(*addr).into())
        .with_context(|| format!("Failed to bind {addr}"))?;
    socket.listen(options.backlog)?;

    let std_listener: std::net::TcpListener = socket.into();
    std_listener.set_nonblocking(true)?;
    let listener = TcpListener::from_std(std_listener)?;

    info!(
        addr = %addr,
        nodelay = options.tcp_nodelay,
        backlog = options.backlog,
        "TCP listener created"
    );

    Ok(listener)
}

/// Serve `app` until `shutdown` is cancelled, then drain in-flight requests
pub async fn serve(
    listener: TcpListener,
    app: axum::Router,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
