//! CONNECT tunnel relay.
//!
//! # Responsibilities
//! - Open the destination connection before confirming anything to the client
//! - Send the fixed `200 Connection established` banner
//! - Pump bytes in both directions until either side closes
//!
//! # Design Decisions
//! - Each direction forwards every read immediately (no aggregation)
//! - No size cap and no idle timeout; a tunnel lives as long as the TLS session
//! - When one direction ends it shuts down its write side and cancels the
//!   other direction, so a half-open peer cannot keep the tunnel alive
//! - Sockets are dropped only after both directions have finished

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::ProxyError;
use crate::relay::connect;

/// Sent to the client once the destination connection is open.
pub const CONNECTION_ESTABLISHED: &[u8] = b"HTTP/1.0 200 Connection established\r\n\r\n";

/// Bytes moved by a finished tunnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunnelStats {
    pub client_to_destination: u64,
    pub destination_to_client: u64,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    ClientToDestination,
    DestinationToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToDestination => f.write_str("client->destination"),
            Direction::DestinationToClient => f.write_str("destination->client"),
        }
    }
}

/// Connect to `host:port`, confirm the tunnel to `client`, then relay until
/// either side disconnects.
///
/// If the destination cannot be reached nothing is written to the client.
pub async fn establish_tunnel<C>(
    client: C,
    host: &str,
    port: u16,
    chunk_size: usize,
) -> Result<TunnelStats, ProxyError>
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    let destination = connect(host, port).await?;

    let mut client = client;
    client
        .write_all(CONNECTION_ESTABLISHED)
        .await
        .map_err(ProxyError::Transfer)?;
    client.flush().await.map_err(ProxyError::Transfer)?;

    Ok(pump_tunnel(client, destination, chunk_size).await)
}

/// Run both forwarding loops until each has observed its own termination.
pub async fn pump_tunnel<C, D>(client: C, destination: D, chunk_size: usize) -> TunnelStats
where
    C: AsyncRead + AsyncWrite,
    D: AsyncRead + AsyncWrite,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (destination_read, destination_write) = tokio::io::split(destination);
    let finished = CancellationToken::new();

    let (client_to_destination, destination_to_client) = tokio::join!(
        pump(
            client_read,
            destination_write,
            chunk_size,
            finished.clone(),
            Direction::ClientToDestination,
        ),
        pump(
            destination_read,
            client_write,
            chunk_size,
            finished.clone(),
            Direction::DestinationToClient,
        ),
    );

    TunnelStats {
        client_to_destination,
        destination_to_client,
    }
}

async fn pump<R, W>(
    mut source: R,
    mut sink: W,
    chunk_size: usize,
    finished: CancellationToken,
    direction: Direction,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            read = source.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(%direction, error = %e, "Tunnel read failed");
                    break;
                }
            },
            _ = finished.cancelled() => break,
        };

        let written = tokio::select! {
            written = sink.write_all(&buf[..n]) => written,
            _ = finished.cancelled() => break,
        };
        if let Err(e) = written {
            tracing::debug!(%direction, error = %e, "Tunnel write failed");
            break;
        }
        total += n as u64;
    }

    if let Err(e) = sink.shutdown().await {
        tracing::trace!(%direction, error = %e, "Tunnel shutdown failed");
    }
    finished.cancel();

    tracing::debug!(%direction, bytes = total, "Tunnel direction finished");
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn relays_both_directions_in_order() {
        let (mut client, client_side) = duplex(1024);
        let (mut destination, destination_side) = duplex(1024);

        let tunnel = tokio::spawn(pump_tunnel(client_side, destination_side, 8));

        let upstream: Vec<u8> = (0..200u8).collect();
        client.write_all(&upstream).await.unwrap();
        let mut seen = vec![0u8; upstream.len()];
        destination.read_exact(&mut seen).await.unwrap();
        assert_eq!(seen, upstream);

        destination.write_all(b"server hello").await.unwrap();
        let mut reply = [0u8; 12];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"server hello");

        drop(client);
        let stats = tokio::time::timeout(Duration::from_secs(2), tunnel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stats,
            TunnelStats {
                client_to_destination: 200,
                destination_to_client: 12,
            }
        );
    }

    #[tokio::test]
    async fn closing_one_end_closes_the_other() {
        let (client, client_side) = duplex(64);
        let (mut destination, destination_side) = duplex(64);

        let tunnel = tokio::spawn(pump_tunnel(client_side, destination_side, 1024));
        drop(client);

        tokio::time::timeout(Duration::from_secs(2), tunnel)
            .await
            .unwrap()
            .unwrap();

        let mut rest = Vec::new();
        destination.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn silent_peer_does_not_hold_tunnel_open() {
        // destination never closes and never writes
        let (client, client_side) = duplex(64);
        let (_destination, destination_side) = duplex(64);

        let tunnel = tokio::spawn(pump_tunnel(client_side, destination_side, 1024));
        drop(client);

        tokio::time::timeout(Duration::from_secs(2), tunnel)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn establish_sends_banner_then_relays() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let echo = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let (mut read, mut write) = socket.split();
            let _ = tokio::io::copy(&mut read, &mut write).await;
        });

        let (mut client, client_side) = duplex(1024);
        let tunnel = tokio::spawn(async move {
            establish_tunnel(client_side, "127.0.0.1", port, 1024).await
        });

        let mut banner = vec![0u8; CONNECTION_ESTABLISHED.len()];
        client.read_exact(&mut banner).await.unwrap();
        assert_eq!(banner, CONNECTION_ESTABLISHED);

        client.write_all(b"\x16\x03\x01 opaque").await.unwrap();
        let mut echoed = [0u8; 10];
        client.read_exact(&mut echoed).await.unwrap();
        assert_eq!(&echoed, b"\x16\x03\x01 opaque");

        drop(client);
        let stats = tokio::time::timeout(Duration::from_secs(2), tunnel)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats.client_to_destination, 10);
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_destination_sends_no_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (mut client, client_side) = duplex(64);
        let err = establish_tunnel(client_side, "127.0.0.1", port, 1024)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "connect");

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert!(received.is_empty());
    }
}
