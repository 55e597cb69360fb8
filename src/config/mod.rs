//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line flags / PROXY_* environment variables (main.rs, clap)
//!     → schema.rs (ProxyConfig with per-section defaults)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → relay settings cloned into every connection task
//! ```
//!
//! # Design Decisions
//! - There is no configuration file; the binary is configured entirely by flags
//! - All fields have defaults so tests can build a config with `Default`
//! - Validation separates syntactic (clap) from semantic checks

pub mod schema;
pub mod validation;

pub use schema::ProxyConfig;
pub use schema::{LifecycleConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig};
pub use validation::{validate_config, ValidationError};
