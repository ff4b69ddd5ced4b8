//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the bridge loop and an
//! external collaborator. Implementations live in `src/adapters/`.

pub mod inference;
pub mod sink;
pub mod transport;

pub use inference::{GenerateFuture, GenerationRequest, GenerationResult, InferenceProvider, Latent};
pub use sink::ResponseSink;
pub use transport::{RecvFuture, RequestSource};
