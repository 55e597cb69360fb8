//! Relay strategies.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor
//!     → connect() opens a fresh destination socket (never reused)
//!     → tunnel.rs   CONNECT: banner, then two concurrent byte pumps
//!     → exchange.rs others: write request, drain reply, write reply back
//! ```
//!
//! # Design Decisions
//! - Both relays are generic over the client stream so tests can use
//!   in-memory duplex pipes
//! - The destination socket is owned by the relay and dropped on every path
//! - No retries and no timeouts; a failure ends the connection

pub mod exchange;
pub mod tunnel;

pub use exchange::exchange;
pub use tunnel::{establish_tunnel, pump_tunnel, TunnelStats, CONNECTION_ESTABLISHED};

use tokio::net::TcpStream;

use crate::error::ProxyError;

/// Open a new TCP connection to the destination.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, ProxyError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| ProxyError::Connect {
            target: format!("{}:{}", host, port),
            source,
        })?;

    tracing::debug!(target_addr = %format_args!("{}:{}", host, port), "Destination connected");
    Ok(stream)
}
