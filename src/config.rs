//! Configuration file loading.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::params::SinkMode;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Generation defaults.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Datagram transport.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Output sink.
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Generation defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model artifact: a descriptor path or a model server URL.
    pub network: Option<String>,
    /// Noise seed for vector requests.
    pub seed: u32,
    /// Default truncation psi.
    pub truncation: f32,
    /// Latent dimensionality for remote providers.
    pub latent_dim: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            network: None,
            seed: 1,
            truncation: 0.5,
            latent_dim: 512,
        }
    }
}

/// Datagram transport settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Port requests arrive on.
    pub listen_port: u16,
    /// Controller address that receives the ready message.
    pub peer: String,
    /// Receive buffer size in bytes.
    pub recv_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_port: 6000,
            peer: "127.0.0.1:7000".to_string(),
            recv_buffer: crate::decoder::RECV_BUFFER,
        }
    }
}

/// Output sink settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Delivery mode.
    pub mode: SinkMode,
    /// File sink path; defaults to `<result-dir>/result.png`.
    pub output: Option<PathBuf>,
    /// Texture sender name.
    pub texture_name: String,
    /// Texture sender width.
    pub texture_width: u32,
    /// Texture sender height.
    pub texture_height: u32,
    /// Directory texture frames are published in; defaults to the result dir.
    pub texture_dir: Option<PathBuf>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            mode: SinkMode::File,
            output: None,
            texture_name: "latent-bridge".to_string(),
            texture_width: 256,
            texture_height: 256,
            texture_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `LATENT_BRIDGE_CONFIG` environment variable
/// 3. `~/.config/latent-bridge/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("LATENT_BRIDGE_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/latent-bridge/config.toml")
    } else {
        PathBuf::from("latent-bridge.toml")
    }
}
