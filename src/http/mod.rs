//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Raw request bytes (net::reader)
//!     → request.rs (protocol downgrade, request line + Host header)
//!     → RequestDescriptor { method, host, port }
//!     → server.rs picks relay::tunnel (CONNECT) or relay::exchange
//! ```
//!
//! Only the request line and the first `Host: ` header are ever inspected.
//! Bodies, folded headers, IPv6 literals and absolute-URI targets are not
//! interpreted.

pub mod request;

pub use request::{classify, downgrade, ParsedRequest, RequestDescriptor, DEFAULT_HTTP_PORT};
