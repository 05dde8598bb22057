use async_trait::async_trait;
use socket2::SockRef;
use std::io;
use std::net::Shutdown;
use tokio::net::TcpStream;

use super::Endpoint;

/// A TCP connection with full half-close support.
///
/// I/O goes through the stream's readiness API, so every operation
/// takes `&self` without locking. Teardown uses shutdown(2) directly:
/// `close_write` sends a FIN, `close_read` and the full `close` unblock
/// a pending read with end-of-stream. A second shutdown reports
/// `ENOTCONN`, which the bridge filter treats as teardown noise; the
/// descriptor itself is released when the endpoint is dropped.
pub struct TcpEndpoint {
    stream: TcpStream,
}

impl TcpEndpoint {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

fn shutdown_socket(stream: &TcpStream, how: Shutdown) -> io::Result<()> {
    SockRef::from(stream).shutdown(how)
}

#[async_trait]
impl Endpoint for TcpEndpoint {
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            self.stream.readable().await?;
            match self.stream.try_read(buf) {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                res => return res,
            }
        }
    }

    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            self.stream.writable().await?;
            match self.stream.try_write(buf) {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                res => return res,
            }
        }
    }

    async fn close(&self) -> io::Result<()> {
        shutdown_socket(&self.stream, Shutdown::Both)
    }

    async fn close_write(&self) -> io::Result<()> {
        shutdown_socket(&self.stream, Shutdown::Write)
    }

    async fn close_read(&self) -> io::Result<()> {
        shutdown_socket(&self.stream, Shutdown::Read)
    }
}
