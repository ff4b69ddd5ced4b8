//! Model artifact resolution and backend detection.

/// Kind of inference backend behind a `--network` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// A model server reached over HTTP.
    Remote,
    /// A local generator descriptor file.
    Synthetic,
}

/// Default model artifact when none is given.
pub const DEFAULT_NETWORK: &str = "results/network.json";

/// Detect the backend from a network location.
#[must_use]
pub fn detect_backend(network: &str) -> Backend {
    if network.starts_with("http://") || network.starts_with("https://") {
        Backend::Remote
    } else {
        Backend::Synthetic
    }
}
