//! Best-effort fixed-chunk drain ("receive all").
//!
//! The proxy never parses `Content-Length` or chunked framing. A message is
//! considered complete when a read returns zero bytes or fewer bytes than the
//! chunk size. This is not RFC compliant:
//!
//! - a message whose final segment exactly fills a chunk makes the reader
//!   wait for one more read, which only returns once the peer sends more or
//!   closes
//! - a message that arrives in several short segments is cut at the first one
//!
//! Both are known limitations, kept as-is.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Read from `source` until a zero or short read, returning everything read.
///
/// Read errors end the loop; whatever was accumulated so far is returned.
pub async fn receive_all<R>(source: &mut R, chunk_size: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut data = Vec::new();
    let mut chunk = vec![0u8; chunk_size];

    loop {
        match source.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                data.extend_from_slice(&chunk[..n]);
                if n < chunk_size {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    received = data.len(),
                    "Read failed, keeping partial data"
                );
                break;
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields `data` once, then fails every read.
    struct FailingReader {
        data: Option<Vec<u8>>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.data.take() {
                Some(data) => {
                    buf.put_slice(&data);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset))),
            }
        }
    }

    #[tokio::test]
    async fn stops_on_short_read() {
        let mut source = Cursor::new(b"GET / HTTP/1.0\r\n\r\n".to_vec());
        let data = receive_all(&mut source, 1024).await;
        assert_eq!(data, b"GET / HTTP/1.0\r\n\r\n");
    }

    #[tokio::test]
    async fn drains_full_chunks_then_tail() {
        let payload: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let mut source = Cursor::new(payload.clone());
        assert_eq!(receive_all(&mut source, 1024).await, payload);
    }

    #[tokio::test]
    async fn exact_multiple_ends_on_eof() {
        let payload = vec![7u8; 2048];
        let mut source = Cursor::new(payload.clone());
        assert_eq!(receive_all(&mut source, 1024).await, payload);
    }

    #[tokio::test]
    async fn closed_peer_yields_nothing() {
        let mut source = Cursor::new(Vec::new());
        assert!(receive_all(&mut source, 1024).await.is_empty());
    }

    #[tokio::test]
    async fn read_error_returns_partial_data() {
        let mut source = FailingReader {
            data: Some(vec![1u8; 16]),
        };
        // chunk == data length, so the reader asks again and hits the error
        assert_eq!(receive_all(&mut source, 16).await, vec![1u8; 16]);
    }

    #[tokio::test]
    async fn short_first_segment_truncates_message() {
        let (mut client, mut proxy) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, b"part one").await.unwrap();

        let data = receive_all(&mut proxy, 1024).await;
        assert_eq!(data, b"part one");
    }
}
