//! HTTP/HTTPS forward proxy library.
//!
//! Accepts client TCP connections, classifies the first request, then either
//! relays one request/response pair (plain HTTP) or opens a raw byte tunnel
//! (`CONNECT`).

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod server;

pub use config::ProxyConfig;
pub use error::{ClassifyError, ProxyError};
pub use lifecycle::Shutdown;
pub use server::ProxyServer;
