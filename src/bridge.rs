use easy_error::ResultExt;
use tokio::sync::mpsc;
use tracing::trace;

use crate::copy::{Event, relay};
use crate::endpoint::Endpoint;
use crate::error::{BridgeError, is_benign};

// Room for every event one invocation can produce (3 per direction plus
// the two final closes), with headroom so no sender ever waits.
const EVENT_BUFFER: usize = 32;

/// Bridge two endpoints: copy in both directions until each source is
/// exhausted, propagate half-closes, then fully close both sides.
///
/// Returns only after both directions have drained and every cleanup
/// close has been attempted; `a` and `b` are fully closed on return no
/// matter the outcome. Errors that are expected teardown noise are
/// filtered out, the rest are merged into one [`BridgeError`].
pub async fn bridge(a: &dyn Endpoint, b: &dyn Endpoint) -> Result<(), BridgeError> {
    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_BUFFER);

    tokio::join!(
        relay(b, "b", a, "a", &tx),
        relay(a, "a", b, "b", &tx),
    );

    // Both copiers are done; close whatever they left open.
    let _ = tx.send(a.close().await.context("close a")).await;
    let _ = tx.send(b.close().await.context("close b")).await;
    drop(tx);

    let mut errors = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            Ok(()) => {}
            Err(e) if is_benign(&e) => trace!("suppressed teardown error: {:?}", e),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::new(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::DuplexEndpoint;
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use test_log::test;

    async fn read_all(ep: &dyn Endpoint) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = ep.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    async fn write_all(ep: &dyn Endpoint, mut data: &[u8]) {
        while !data.is_empty() {
            let n = ep.write(data).await.unwrap();
            data = &data[n..];
        }
    }

    #[test(tokio::test)]
    async fn one_way_transfer_with_half_close() {
        let (client, a) = DuplexEndpoint::pair(4096);
        let (server, b) = DuplexEndpoint::pair(4096);
        let bridged = tokio::spawn(async move { bridge(&a, &b).await });

        write_all(&client, b"hello bridge").await;
        client.close_write().await.unwrap();

        assert_eq!(read_all(&server).await, b"hello bridge");
        server.close().await.unwrap();

        bridged.await.unwrap().unwrap();
        // the far side saw end-of-stream as well
        assert_eq!(read_all(&client).await, b"");
    }

    #[test(tokio::test)]
    async fn echo_round_trip_keeps_bytes_intact() {
        let (client, a) = DuplexEndpoint::pair(4096);
        let (server, b) = DuplexEndpoint::pair(4096);
        let bridged = tokio::spawn(async move { bridge(&a, &b).await });

        write_all(&client, b"ping").await;

        let mut buf = [0u8; 4];
        let mut got = 0;
        while got < buf.len() {
            got += server.read(&mut buf[got..]).await.unwrap();
        }
        assert_eq!(&buf, b"ping");

        write_all(&server, b"pong").await;
        server.close().await.unwrap();

        assert_eq!(read_all(&client).await, b"pong");
        client.close().await.unwrap();

        bridged.await.unwrap().unwrap();
    }

    #[test(tokio::test)]
    async fn burst_write_then_full_close_delivers_everything() {
        const SEND_BYTES: usize = 98_880;

        let (client, a) = DuplexEndpoint::pair(4096);
        let (server, b) = DuplexEndpoint::pair(4096);
        let bridged = tokio::spawn(async move { bridge(&a, &b).await });

        let writer = tokio::spawn(async move {
            let payload = vec![0x5au8; SEND_BYTES];
            write_all(&client, &payload).await;
            client.close().await.unwrap();
        });

        let received = read_all(&server).await;
        assert_eq!(received.len(), SEND_BYTES);
        server.close().await.unwrap();

        writer.await.unwrap();
        bridged.await.unwrap().unwrap();
    }

    #[test(tokio::test)]
    async fn simultaneous_clean_close_is_not_an_error() {
        let (client, a) = DuplexEndpoint::pair(4096);
        let (server, b) = DuplexEndpoint::pair(4096);
        let bridged = tokio::spawn(async move { bridge(&a, &b).await });

        client.close().await.unwrap();
        server.close().await.unwrap();

        bridged.await.unwrap().unwrap();
    }

    #[test(tokio::test)]
    async fn already_closed_endpoint_is_filtered() {
        let (_client, a) = DuplexEndpoint::pair(4096);
        let (server, b) = DuplexEndpoint::pair(4096);
        a.close().await.unwrap();
        server.close().await.unwrap();

        bridge(&a, &b).await.unwrap();
    }

    struct FaultyEndpoint {
        closed: AtomicBool,
    }

    #[async_trait]
    impl Endpoint for FaultyEndpoint {
        async fn read(&self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("injected read failure"))
        }
        async fn write(&self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        async fn close(&self) -> io::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test(tokio::test)]
    async fn genuine_copy_error_is_surfaced() {
        let faulty = FaultyEndpoint {
            closed: AtomicBool::new(false),
        };
        let (server, b) = DuplexEndpoint::pair(4096);
        server.close().await.unwrap();

        let err = bridge(&faulty, &b).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("injected read failure"), "got: {}", text);
        // teardown still ran on every side
        assert!(faulty.closed.load(Ordering::SeqCst));
        assert!(b.is_closed());
    }
}
