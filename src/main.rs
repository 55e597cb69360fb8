//! HTTP/HTTPS forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ net::reader ──▶ http::request ──▶ server
//!                                                 (classify)      (dispatch)
//!                                                                    │
//!                                        CONNECT ┌───────────────────┴──────┐ other methods
//!                                                ▼                          ▼
//!                                         relay::tunnel              relay::exchange
//!                                                │                          │
//!                                                └──────▶ Destination ◀─────┘
//!
//!   Cross-cutting: config · lifecycle (signals, shutdown, drain) · observability (logging)
//! ```

use clap::Parser;

use forward_proxy::config::{
    LifecycleConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RelayConfig,
};
use forward_proxy::lifecycle::{self, Shutdown};
use forward_proxy::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "forward-proxy", version)]
#[command(about = "HTTP/HTTPS forward proxy with CONNECT tunneling", long_about = None)]
struct Cli {
    /// Host to listen on
    #[arg(long, env = "PROXY_HOST", default_value = "localhost")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PROXY_PORT", default_value_t = 8080)]
    port: u16,

    /// Bytes requested per socket read
    #[arg(long, env = "PROXY_CHUNK_SIZE", default_value_t = 1024)]
    chunk_size: usize,

    /// trace, debug, info, warn or error (RUST_LOG takes precedence)
    #[arg(long, env = "PROXY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "PROXY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Seconds to wait for open connections after a stop signal
    #[arg(long, env = "PROXY_SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    shutdown_grace_secs: u64,
}

impl Cli {
    fn into_config(self) -> ProxyConfig {
        ProxyConfig {
            listener: ListenerConfig {
                host: self.host,
                port: self.port,
            },
            relay: RelayConfig {
                chunk_size: self.chunk_size,
            },
            observability: ObservabilityConfig {
                log_level: self.log_level,
                log_format: self.log_format,
            },
            lifecycle: LifecycleConfig {
                shutdown_grace_secs: self.shutdown_grace_secs,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config();

    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "forward-proxy starting");
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        chunk_size = config.relay.chunk_size,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            lifecycle::wait_for_signal().await;
            shutdown.trigger();
        });
    }

    lifecycle::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
