//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → a `connection` span per client (connection_id, peer_addr)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging only; the proxy keeps no metrics state
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;
