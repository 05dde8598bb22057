//! Endpoint abstraction for the bridge.
//!
//! An [`Endpoint`] is a bidirectional byte stream whose read and write
//! sides can be torn down independently. Half-close support is expressed
//! through the optional `close_write`/`close_read` methods: endpoints
//! that cannot shut down one direction in isolation keep the default
//! implementations, which fall back to a full close.

use async_trait::async_trait;
use std::io;

mod duplex;
mod stream;
mod tcp;

pub use duplex::DuplexEndpoint;
pub use stream::StreamEndpoint;
pub use tcp::TcpEndpoint;

/// A bidirectional byte stream with separable read/write lifecycles.
///
/// All methods take `&self`: one task may be mid-read while another
/// writes or closes the same endpoint. Implementations provide the
/// interior locking and must turn a concurrent close into a local
/// `io::Error` on the pending operation, never undefined behavior.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Read into `buf`, returning `Ok(0)` at end-of-stream.
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write from `buf`, returning how many bytes were accepted.
    async fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Fully close both directions.
    async fn close(&self) -> io::Result<()>;

    /// Close only the outbound direction, signalling end-of-stream to
    /// the peer while reads stay usable.
    async fn close_write(&self) -> io::Result<()> {
        self.close().await
    }

    /// Close only the inbound direction, leaving writes usable.
    async fn close_read(&self) -> io::Result<()> {
        self.close().await
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "use of closed connection")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;

    // Endpoint with only the required methods, to exercise the
    // full-close fallback of the half-close defaults.
    struct FullCloseOnly {
        closes: AtomicUsize,
    }

    #[async_trait]
    impl Endpoint for FullCloseOnly {
        async fn read(&self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
        async fn write(&self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        async fn close(&self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test(tokio::test)]
    async fn half_close_defaults_fall_back_to_full_close() {
        let ep = FullCloseOnly {
            closes: AtomicUsize::new(0),
        };
        ep.close_write().await.unwrap();
        assert_eq!(ep.closes.load(Ordering::SeqCst), 1);
        ep.close_read().await.unwrap();
        assert_eq!(ep.closes.load(Ordering::SeqCst), 2);
    }
}
