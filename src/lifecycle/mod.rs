//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Bind listener → Run accept loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Wait for in-flight connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: invalid config or a bind failure is fatal
//! - Shutdown never cancels a running connection; the drain has a deadline
//!   after which the process exits anyway

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{run, StartupError};
