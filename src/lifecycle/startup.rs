//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Bind the listener
//! - Run the dispatcher until shutdown, then drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The shutdown subscription is taken before binding so an early signal is not lost

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{validate_config, ProxyConfig, ValidationError};
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::server::ProxyServer;
use crate::lifecycle::Shutdown;

/// Errors that stop the proxy before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate, bind, serve until `shutdown` triggers, then drain.
pub async fn run(config: ProxyConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let stop = shutdown.subscribe();

    validate_config(&config).map_err(StartupError::Config)?;
    let listener = Listener::bind(&config.listener).await?;

    serve(listener, &config, stop).await;
    Ok(())
}

/// Run the dispatcher on an already bound listener, then drain.
pub async fn serve(listener: Listener, config: &ProxyConfig, stop: broadcast::Receiver<()>) {
    let server = ProxyServer::new(config.relay);
    let tracker = server.tracker();

    tracing::info!(chunk_size = config.relay.chunk_size, "Dispatcher starting");
    server.run(listener, stop).await;

    drain(&tracker, config.lifecycle.shutdown_grace()).await;
}

async fn drain(tracker: &ConnectionTracker, grace: std::time::Duration) {
    if tracker.active_count() == 0 {
        return;
    }

    tracing::info!(
        active_connections = tracker.active_count(),
        grace_secs = grace.as_secs(),
        "Waiting for in-flight connections"
    );

    if tokio::time::timeout(grace, tracker.wait_for_idle()).await.is_err() {
        tracing::warn!(
            active_connections = tracker.active_count(),
            "Grace period elapsed, abandoning open connections"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn invalid_config_fails_fast() {
        let mut config = ProxyConfig::default();
        config.relay.chunk_size = 0;

        let err = run(config, &Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(_)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: relay chunk size must be greater than zero"
        );
    }

    #[tokio::test]
    async fn trigger_stops_running_proxy() {
        let mut config = ProxyConfig::default();
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;

        let shutdown = Shutdown::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { run(config, &shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn drain_gives_up_after_grace() {
        let tracker = ConnectionTracker::new();
        let _stuck = tracker.track();

        tokio::time::timeout(Duration::from_secs(2), drain(&tracker, Duration::from_millis(200)))
            .await
            .unwrap();
        assert_eq!(tracker.active_count(), 1);
    }
}
