//! Validated runtime settings, built once at startup from config and CLI.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::error::StartupError;
use crate::model::DEFAULT_NETWORK;
use crate::params::{validate_truncation, SinkMode};

/// Default root directory for results.
pub const DEFAULT_RESULT_DIR: &str = "results";
/// File sink name inside the result directory.
pub const RESULT_FILE: &str = "result.png";

/// Shared-texture sender parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSettings {
    /// Sender name.
    pub name: String,
    /// Sender width.
    pub width: u32,
    /// Sender height.
    pub height: u32,
    /// Directory frames are published in.
    pub dir: PathBuf,
}

/// Everything the bridge needs, validated.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Model artifact location.
    pub checkpoint: String,
    /// Noise seed for vector requests.
    pub seed: u32,
    /// Default truncation psi.
    pub truncation: f32,
    /// Latent dimensionality for remote providers.
    pub latent_dim: usize,
    /// Delivery mode.
    pub sink_mode: SinkMode,
    /// Root directory for results.
    pub result_dir: PathBuf,
    /// File sink path.
    pub output: PathBuf,
    /// Texture sink parameters.
    pub texture: TextureSettings,
    /// UDP port to listen on.
    pub listen_port: u16,
    /// Controller address.
    pub peer: SocketAddr,
    /// Receive buffer size.
    pub recv_buffer: usize,
}

impl BridgeSettings {
    /// Merge CLI arguments over the config file and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if truncation is out of range, the peer address does
    /// not resolve, or the receive buffer is empty.
    pub fn resolve(config: &Config, args: &GenerateArgs) -> Result<Self, StartupError> {
        let generation = &config.generation;
        let truncation = args.truncation_psi.unwrap_or(generation.truncation);
        validate_truncation(truncation).map_err(|e| StartupError::Config(e.to_string()))?;

        let peer_str = args.peer.as_deref().unwrap_or(&config.transport.peer);
        let peer = peer_str
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| StartupError::Config(format!("cannot resolve peer '{peer_str}'")))?;

        if config.transport.recv_buffer == 0 {
            return Err(StartupError::Config("recv_buffer must be positive".into()));
        }

        let result_dir = args
            .result_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULT_DIR));
        let output = args
            .output
            .clone()
            .or_else(|| config.sink.output.clone())
            .unwrap_or_else(|| result_dir.join(RESULT_FILE));
        let texture_dir = config.sink.texture_dir.clone();
        let texture = TextureSettings {
            name: config.sink.texture_name.clone(),
            width: config.sink.texture_width,
            height: config.sink.texture_height,
            dir: texture_dir.unwrap_or_else(|| result_dir.clone()),
        };

        Ok(Self {
            checkpoint: args
                .network
                .clone()
                .or_else(|| generation.network.clone())
                .unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            seed: args.seed.unwrap_or(generation.seed),
            truncation,
            latent_dim: generation.latent_dim,
            sink_mode: args.sink.unwrap_or(config.sink.mode),
            result_dir,
            output,
            texture,
            listen_port: args.listen_port.unwrap_or(config.transport.listen_port),
            peer,
            recv_buffer: config.transport.recv_buffer,
        })
    }
}
