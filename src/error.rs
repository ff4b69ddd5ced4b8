//! Error taxonomy for the bridge.
//!
//! Only [`DecodeError`] and [`SinkError`] are recoverable: the bridge loop logs
//! them and moves on to the next request. Everything that ends up in
//! [`BridgeError`] terminates the session.

use thiserror::Error;

/// A request could not be turned into a [`GenerationRequest`](crate::ports::GenerationRequest).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The datagram payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    /// A command that needs an argument arrived without one.
    #[error("command '{command}' requires an argument")]
    MissingArgument {
        /// The command name.
        command: String,
    },

    /// A command carried more tokens than it accepts.
    #[error("command '{command}' takes 1 argument, got {got}")]
    ExtraArguments {
        /// The command name.
        command: String,
        /// Number of argument tokens received.
        got: usize,
    },

    /// The seed token is not a non-negative 32-bit integer.
    #[error("invalid seed '{0}'")]
    BadSeed(String),

    /// A numeric argument could not be parsed.
    #[error("invalid number '{0}'")]
    BadNumber(String),

    /// The latent vector has the wrong length for the loaded provider.
    #[error("latent vector has {got} components, provider expects {expected}")]
    BadDimension {
        /// Dimensionality the provider expects.
        expected: usize,
        /// Dimensionality that was supplied.
        got: usize,
    },

    /// A value lies outside its accepted range.
    #[error("{field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
        /// Inclusive lower bound.
        min: f32,
        /// Inclusive upper bound.
        max: f32,
    },
}

/// The inference call failed. The provider state is undefined afterwards.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote model server answered with a non-success status.
    #[error("model server error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or explanation.
        message: String,
    },

    /// The model server could not be reached.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider returned something that is not a usable image.
    #[error("malformed provider output: {0}")]
    MalformedOutput(String),

    /// An earlier failure left the provider unusable.
    #[error("provider is unusable after an earlier failure; load it again")]
    Unusable,

    /// The latent handed to the provider has the wrong length.
    #[error("latent has {got} components, provider expects {expected}")]
    Dimension {
        /// Dimensionality the provider expects.
        expected: usize,
        /// Dimensionality that was supplied.
        got: usize,
    },
}

/// A generated image could not be delivered.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the filesystem failed.
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// Destination that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding the image failed.
    #[error("image encoding error: {0}")]
    Encode(String),

    /// The sink was already released.
    #[error("sink has been released")]
    Released,
}

/// Fatal failure while assembling the bridge.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The model artifact is missing or unreadable.
    #[error("cannot read model artifact {path}: {reason}")]
    Artifact {
        /// Artifact location.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// Configuration file or settings are invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Binding the receive socket failed.
    #[error("cannot bind UDP port {port}: {source}")]
    Bind {
        /// Port that was requested.
        port: u16,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A sink or provider resource could not be created.
    #[error("cannot create {what}: {reason}")]
    Resource {
        /// Kind of resource.
        what: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// An option passed by a plugin host was invalid.
    #[error("invalid setup option: {0}")]
    Option(String),
}

/// Receiving from the transport failed.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(#[from] pub std::io::Error);

/// Any fatal error that ends a bridge session.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Inference failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Startup failed.
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid command-line argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Batch rendering could not write its output.
    #[error(transparent)]
    Sink(#[from] SinkError),
}
