//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use forward_proxy::config::ProxyConfig;
use forward_proxy::lifecycle::startup;
use forward_proxy::net::{receive_all, Listener};
use forward_proxy::Shutdown;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Upper bound for any single network step in a test.
#[allow(dead_code)]
pub const STEP: Duration = Duration::from_secs(5);

/// A proxy running on an ephemeral localhost port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

/// Start the proxy on 127.0.0.1 with an OS-assigned port.
pub async fn start_proxy() -> RunningProxy {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.lifecycle.shutdown_grace_secs = 1;

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        startup::serve(listener, &config, stop).await;
    });

    RunningProxy { addr, shutdown, handle }
}

/// Start a destination that records each request and answers with `response`.
#[allow(dead_code)]
pub async fn start_mock_backend(
    response: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let request = receive_all(&mut socket, 1024).await;
                let _ = tx.send(request);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Start a destination that echoes every byte back until the peer closes.
#[allow(dead_code)]
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut read, mut write) = socket.split();
                let _ = tokio::io::copy(&mut read, &mut write).await;
            });
        }
    });

    addr
}

/// A localhost port with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
