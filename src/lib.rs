//! stream-bridge
//!
//! Connects two bidirectional byte streams: data is copied in both
//! directions concurrently, half-close signals are propagated, and both
//! endpoints are fully torn down before the bridge returns. Errors that
//! are expected teardown noise (double closes, already-closed peers) are
//! filtered out; everything else is collected into a single
//! [`BridgeError`].

pub mod bridge;
pub mod copy;
pub mod endpoint;
pub mod error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types for convenience
pub use bridge::bridge;
pub use endpoint::{DuplexEndpoint, Endpoint, StreamEndpoint, TcpEndpoint};
pub use error::BridgeError;
