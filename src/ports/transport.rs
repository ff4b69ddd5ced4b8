//! Request source port: where raw requests come from.

use std::future::Future;
use std::pin::Pin;

use crate::error::TransportError;

/// Boxed future type returned by [`RequestSource::recv`].
pub type RecvFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send + 'a>>;

/// Yields raw request payloads, one at a time.
pub trait RequestSource: Send {
    /// Wait for the next payload. `Ok(None)` means the transport is closed.
    fn recv(&mut self) -> RecvFuture<'_>;

    /// Close the transport. Idempotent.
    fn close(&mut self);
}
