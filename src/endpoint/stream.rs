use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::{Endpoint, closed_error};

/// Adapts any async byte stream into a full-close-only [`Endpoint`].
///
/// Generic stream types give no way to tear down one direction in
/// isolation, so the half-close operations keep their full-close
/// fallback.
pub struct StreamEndpoint<T> {
    reader: Mutex<Option<ReadHalf<T>>>,
    writer: Mutex<Option<WriteHalf<T>>>,
    closed: CancellationToken,
}

impl<T: AsyncRead + AsyncWrite + Send> StreamEndpoint<T> {
    pub fn new(stream: T) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            closed: CancellationToken::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[async_trait]
impl<T: AsyncRead + AsyncWrite + Send + 'static> Endpoint for StreamEndpoint<T> {
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
            guard = self.writer.lock() => guard,
        };
        match guard.as_mut() {
            Some(writer) => tokio::select! {
                biased;
                _ = self.closed.cancelled() => Err(closed_error()),
                res = writer.write(buf) => res,
            },
            None => Err(closed_error()),
        }
    }

    async fn close(&self) -> io::Result<()> {
        if self.closed.is_cancelled() {
            return Err(closed_error());
        }
        self.closed.cancel();
        let res = match self.writer.lock().await.take() {
            Some(mut writer) => writer.shutdown().await,
            None => Ok(()),
        };
        let _ = self.reader.lock().await.take();
        res
    }
}
