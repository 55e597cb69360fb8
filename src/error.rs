//! Error taxonomy for a single proxied connection.
//!
//! Every variant is terminal for the connection that produced it and is
//! handled at the per-connection boundary in `server`. None of them reach the
//! accept loop.

use std::io;

use thiserror::Error;

/// The initial request could not be turned into a destination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("empty request")]
    Empty,

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    #[error("CONNECT request without a host:port target")]
    MissingConnectTarget,

    #[error("no 'Host: ' header")]
    MissingHostHeader,

    #[error("'Host: ' header is not terminated by CRLF")]
    UnterminatedHostHeader,

    #[error("destination host is empty")]
    EmptyHost,

    #[error("invalid destination port '{0}'")]
    InvalidPort(String),

    #[error("destination is not valid UTF-8")]
    InvalidEncoding,
}

/// Failure while serving one client connection.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Malformed request line or headers.
    #[error("malformed request: {0}")]
    Parse(#[from] ClassifyError),

    /// Destination unreachable or refused.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// I/O failure after the destination connection was opened.
    #[error("transfer failed: {0}")]
    Transfer(#[source] io::Error),
}

impl ProxyError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Parse(_) => "parse",
            ProxyError::Connect { .. } => "connect",
            ProxyError::Transfer(_) => "transfer",
        }
    }
}
