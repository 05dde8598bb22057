use easy_error::{Error, ResultExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::endpoint::Endpoint;

pub(crate) type Event = Result<(), Error>;

const BUFFER_SIZE: usize = 65536;

/// Drain `src` into `dst` until end-of-stream or error, returning the
/// number of bytes moved.
pub async fn copy_stream(
    src: &dyn Endpoint,
    rn: &str,
    dst: &dyn Endpoint,
    wn: &str,
) -> Result<u64, Error> {
    let mut buf = [0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let len = src
            .read(&mut buf)
            .await
            .with_context(|| format!("read from {}", rn))?;
        if len == 0 {
            break;
        }
        let mut pos = 0;
        while pos < len {
            let n = dst
                .write(&buf[pos..len])
                .await
                .with_context(|| format!("write to {}", wn))?;
            pos += n;
        }
        total += len as u64;
    }
    Ok(total)
}

/// One direction of the bridge: copy until the source is exhausted, then
/// tear down the destination's write side and the source's read side.
/// Every outcome is reported; the teardown steps run even when the copy
/// fails.
pub(crate) async fn relay(
    src: &dyn Endpoint,
    rn: &str,
    dst: &dyn Endpoint,
    wn: &str,
    events: &mpsc::Sender<Event>,
) {
    let copied = copy_stream(src, rn, dst, wn).await;
    match &copied {
        Ok(n) => debug!("{} to {}: {} bytes forwarded", rn, wn, n),
        Err(e) => debug!("{} to {}: transfer stopped: {}", rn, wn, e),
    }
    let _ = events.send(copied.map(|_| ())).await;
    let _ = events
        .send(
            dst.close_write()
                .await
                .with_context(|| format!("close write {}", wn)),
        )
        .await;
    let _ = events
        .send(
            src.close_read()
                .await
                .with_context(|| format!("close read {}", rn)),
        )
        .await;
}
