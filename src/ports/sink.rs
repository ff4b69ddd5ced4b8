//! Response sink port: where generated images go.

use crate::error::SinkError;
use crate::ports::GenerationResult;

/// Consumes generated images.
///
/// The delivery mode is fixed when the sink is constructed.
pub trait ResponseSink: Send {
    /// Deliver one image. Ownership moves into the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the image could not be delivered. The bridge
    /// logs it and keeps running.
    fn deliver(&mut self, result: GenerationResult) -> Result<(), SinkError>;

    /// Release any held resources. Further deliveries fail.
    fn release(&mut self);

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
