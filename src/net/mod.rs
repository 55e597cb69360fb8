//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept loop source)
//!     → connection.rs (id, state machine, passive tracking)
//!     → reader.rs (drain the initial request)
//!     → Hand off to http::request for classification
//!
//! Connection States:
//!     Accepted → Classified → Tunneling | Relaying → Closed
//! ```
//!
//! # Design Decisions
//! - No accept-side limits or queueing; every connection gets its own task
//! - Each connection tracked only for logging and shutdown drain

pub mod connection;
pub mod listener;
pub mod reader;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Accept, Listener, ListenerError};
pub use reader::receive_all;
