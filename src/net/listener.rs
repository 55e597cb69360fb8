//! TCP listener for the proxy endpoint.
//!
//! # Responsibilities
//! - Resolve and bind the configured `(host, port)`
//! - Accept incoming TCP connections
//! - Report accept errors without tearing down the listener

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// Source of client connections for the dispatcher.
pub trait Accept {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next client connection.
    fn accept(
        &self,
    ) -> impl Future<Output = Result<(Self::Stream, SocketAddr), ListenerError>> + Send;
}

/// The proxy's listening socket.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured host and port.
    ///
    /// The host may be a name (`localhost`); it is resolved by the runtime.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = format!("{}:{}", config.host, config.port);

        let inner = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| ListenerError::Bind {
                address: address.clone(),
                source,
            })?;

        let local_addr = inner
            .local_addr()
            .map_err(|source| ListenerError::Bind { address, source })?;

        tracing::info!(address = %local_addr, "Proxy server listening");

        Ok(Self { inner })
    }

    /// Accept the next client connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self
            .inner
            .accept()
            .await
            .map_err(ListenerError::Accept)?;
        tracing::info!(peer_addr = %addr, "Accepted connection");
        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }
}

impl Accept for Listener {
    type Stream = TcpStream;

    fn accept(
        &self,
    ) -> impl Future<Output = Result<(Self::Stream, SocketAddr), ListenerError>> + Send {
        Listener::accept(self)
    }
}
