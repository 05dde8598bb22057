use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, SimplexStream, WriteHalf, simplex};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::{Endpoint, closed_error};

/// One side of an in-memory connected pair, built from two simplex pipes.
///
/// Write half-close is supported: the peer drains whatever is buffered
/// and then observes end-of-stream. Read half-close is not, so
/// `close_read` falls back to a full close. Writing after the peer has
/// fully closed fails with a synthetic `BrokenPipe`.
pub struct DuplexEndpoint {
    reader: Mutex<Option<ReadHalf<SimplexStream>>>,
    writer: Mutex<Option<WriteHalf<SimplexStream>>>,
    closed: CancellationToken,
    peer_closed: CancellationToken,
}

impl DuplexEndpoint {
    /// Create a connected pair; each side reads what the other writes.
    pub fn pair(max_buf_size: usize) -> (DuplexEndpoint, DuplexEndpoint) {
        let (left_read, right_write) = simplex(max_buf_size);
        let (right_read, left_write) = simplex(max_buf_size);
        let left_token = CancellationToken::new();
        let right_token = CancellationToken::new();
        let left = DuplexEndpoint {
            reader: Mutex::new(Some(left_read)),
            writer: Mutex::new(Some(left_write)),
            closed: left_token.clone(),
            peer_closed: right_token.clone(),
        };
        let right = DuplexEndpoint {
            reader: Mutex::new(Some(right_read)),
            writer: Mutex::new(Some(right_write)),
            closed: right_token,
            peer_closed: left_token,
        };
        (left, right)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[async_trait]
impl Endpoint for DuplexEndpoint {
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(closed_error()),
            guard = self.reader.lock() => guard,
        };
        match guard.as_mut() {
            Some(reader) => tokio::select! {
                biased;
                _ = self.closed.cancelled() => Err(closed_error()),
                res = reader.read(buf) => res,
            },
            None => Err(closed_error()),
        }
    }

    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(closed_error()),
            _ = self.peer_closed.cancelled() => return Err(io::ErrorKind::BrokenPipe.into()),
            guard = self.writer.lock() => guard,
        };
        match guard.as_mut() {
            Some(writer) => tokio::select! {
                biased;
                _ = self.closed.cancelled() => Err(closed_error()),
                _ = self.peer_closed.cancelled() => Err(io::ErrorKind::BrokenPipe.into()),
                res = writer.write(buf) => res,
            },
            None => Err(closed_error()),
        }
    }

    async fn close(&self) -> io::Result<()> {
        if self.closed.is_cancelled() {
            return Err(closed_error());
        }
        // Cancel first so a pending read/write wakes and releases its lock.
        self.closed.cancel();
        let res = match self.writer.lock().await.take() {
            Some(mut writer) => writer.shutdown().await,
            None => Ok(()),
        };
        let _ = self.reader.lock().await.take();
        res
    }

    async fn close_write(&self) -> io::Result<()> {
        match self.writer.lock().await.take() {
            Some(mut writer) => writer.shutdown().await,
            None => Err(closed_error()),
        }
    }
}
