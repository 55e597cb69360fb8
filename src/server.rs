//! Connection dispatcher.
//!
//! # Responsibilities
//! - Run the accept loop until shutdown is signalled
//! - Spawn one task per accepted connection
//! - Read and classify the initial request
//! - Route CONNECT to the tunnel relay and everything else to the exchange relay
//! - Close the client socket on every path
//!
//! # Design Decisions
//! - The accept loop never awaits a connection task
//! - Every error is handled inside the connection task; nothing reaches the loop
//! - Shutdown stops accepting only; in-flight connections run to completion

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::RelayConfig;
use crate::error::ProxyError;
use crate::http::classify;
use crate::net::{receive_all, Accept, ConnectionGuard, ConnectionState, ConnectionTracker};
use crate::relay::{establish_tunnel, exchange};

/// Pause after a failed accept, so descriptor exhaustion does not spin the loop.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Forward proxy server: accept loop plus per-connection dispatch.
pub struct ProxyServer {
    relay: RelayConfig,
    tracker: ConnectionTracker,
}

impl ProxyServer {
    /// Create a new server with the given relay settings.
    pub fn new(relay: RelayConfig) -> Self {
        Self {
            relay,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Handle to the live-connection count, usable after `run` consumes the server.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until `shutdown` fires (or its sender is dropped).
    ///
    /// A failed accept is logged and followed by [`ACCEPT_ERROR_BACKOFF`];
    /// shutdown still wins during the pause.
    pub async fn run<L>(self, listener: L, mut shutdown: broadcast::Receiver<()>)
    where
        L: Accept,
    {
        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = shutdown.recv() => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let guard = self.tracker.track();
                    tokio::spawn(handle_connection(stream, peer, self.relay, guard));
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backoff_ms = ACCEPT_ERROR_BACKOFF.as_millis() as u64,
                        "Accept failed"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                        _ = shutdown.recv() => break,
                    }
                }
            }
        }

        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Accept loop stopping"
        );
    }
}

/// Serve one client connection from first byte to close.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    relay: RelayConfig,
    mut guard: ConnectionGuard,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let span = tracing::info_span!(
        "connection",
        connection_id = %guard.id(),
        peer_addr = %peer
    );

    async move {
        if let Err(e) = dispatch(&mut stream, relay, &mut guard).await {
            tracing::warn!(
                kind = e.kind(),
                error = %e,
                state = %guard.state(),
                "Connection aborted"
            );
        }

        if let Err(e) = stream.shutdown().await {
            tracing::trace!(error = %e, "Client shutdown failed");
        }
        drop(stream);
        guard.transition(ConnectionState::Closed);
    }
    .instrument(span)
    .await
}

async fn dispatch<S>(
    stream: &mut S,
    relay: RelayConfig,
    guard: &mut ConnectionGuard,
) -> Result<(), ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = receive_all(stream, relay.chunk_size).await;
    let request = classify(&raw)?;
    guard.transition(ConnectionState::Classified);

    let target = &request.descriptor;
    tracing::info!(
        method = %target.method,
        host = %target.host,
        port = target.port,
        "Request classified"
    );

    if target.is_tunnel() {
        guard.transition(ConnectionState::Tunneling);
        let stats =
            establish_tunnel(&mut *stream, &target.host, target.port, relay.chunk_size).await?;
        tracing::info!(
            sent = stats.client_to_destination,
            received = stats.destination_to_client,
            "Tunnel closed"
        );
    } else {
        guard.transition(ConnectionState::Relaying);
        let bytes = exchange(
            stream,
            &target.host,
            target.port,
            &request.payload,
            relay.chunk_size,
        )
        .await?;
        tracing::info!(response_bytes = bytes, "Response relayed");
    }

    Ok(())
}
