//! Single request/response relay for non-CONNECT methods.
//!
//! One destination connection per request: write the downgraded request,
//! drain the reply with the byte reader, write it back, close. The downgrade
//! to HTTP/1.0 and `Connection: close` is what makes the drain terminate.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ProxyError;
use crate::net::reader::receive_all;
use crate::relay::connect;

/// Forward `request` to `host:port` and copy the reply to `client`.
///
/// Returns the number of reply bytes written to the client.
pub async fn exchange<C>(
    client: &mut C,
    host: &str,
    port: u16,
    request: &[u8],
    chunk_size: usize,
) -> Result<usize, ProxyError>
where
    C: AsyncWrite + Unpin + ?Sized,
{
    let mut destination = connect(host, port).await?;

    destination
        .write_all(request)
        .await
        .map_err(ProxyError::Transfer)?;

    let response = receive_all(&mut destination, chunk_size).await;

    client
        .write_all(&response)
        .await
        .map_err(ProxyError::Transfer)?;
    client.flush().await.map_err(ProxyError::Transfer)?;

    if let Err(e) = destination.shutdown().await {
        tracing::debug!(error = %e, "Destination shutdown failed");
    }

    Ok(response.len())
}
