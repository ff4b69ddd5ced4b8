//! Plugin-host callbacks.
//!
//! A host service calls [`setup`] once with its option map, then
//! [`PluginModel::generate`] per request. Images are returned to the caller
//! directly; nothing is written to disk.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::context::load_provider;
use crate::decoder::decode_vector;
use crate::error::{DecodeError, ProviderError, SinkError, StartupError};
use crate::output::png_data_uri;
use crate::params::{validate_truncation, SETUP_SEED_MAX};
use crate::ports::GenerationResult;
use crate::session::Session;

fn default_truncation() -> f32 {
    1.0
}

/// Options recognised by [`setup`].
#[derive(Debug, Clone, Deserialize)]
pub struct SetupOptions {
    /// Seed for the model's noise state, `0..=1_000_000`.
    #[serde(default)]
    pub seed: u32,
    /// Default truncation psi, `[0, 2]`.
    #[serde(default = "default_truncation")]
    pub truncation: f32,
    /// Model artifact: descriptor path or model server URL.
    pub checkpoint: String,
    /// Latent dimensionality for remote checkpoints.
    #[serde(default = "default_latent_dim")]
    pub latent_dim: usize,
}

fn default_latent_dim() -> usize {
    512
}

impl SetupOptions {
    /// Parse and range-check an option map.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing, mistyped, or out of range.
    pub fn from_value(options: &Value) -> Result<Self, StartupError> {
        let opts: Self = serde_json::from_value(options.clone())
            .map_err(|e| StartupError::Option(e.to_string()))?;
        if opts.seed > SETUP_SEED_MAX {
            return Err(StartupError::Option(format!(
                "seed {} is outside [0, {SETUP_SEED_MAX}]",
                opts.seed
            )));
        }
        validate_truncation(opts.truncation).map_err(|e| StartupError::Option(e.to_string()))?;
        Ok(opts)
    }
}

/// Input of the `generate` callback.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInput {
    /// Latent vector.
    pub z: Vec<f32>,
    /// Truncation psi; the setup value when absent.
    #[serde(default)]
    pub truncation: Option<f32>,
}

/// Output of the `generate` callback.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOutput {
    /// The generated image.
    pub image: GenerationResult,
}

impl GenerateOutput {
    /// Host wire form: `{"image": "data:image/png;base64,..."}`.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_json(&self) -> Result<Value, SinkError> {
        Ok(serde_json::json!({ "image": png_data_uri(&self.image)? }))
    }
}

/// Failure of the `generate` callback.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The input map is not `{z, truncation}`.
    #[error("invalid generate input: {0}")]
    Input(String),
    /// The request failed validation.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Inference failed. The model must be set up again.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A model loaded by [`setup`].
pub struct PluginModel {
    session: Session,
    options: SetupOptions,
    poisoned: bool,
}

/// `setup` callback: validate options and load the model.
///
/// # Errors
///
/// Returns an error if the options are invalid or the model cannot be loaded.
pub fn setup(options: &Value) -> Result<PluginModel, StartupError> {
    let options = SetupOptions::from_value(options)?;
    info!(
        seed = options.seed,
        truncation = options.truncation,
        "[SETUP] ran with options"
    );
    let provider = load_provider(&options.checkpoint, options.latent_dim)?;
    let session = Session::new(provider, options.truncation, options.seed);
    Ok(PluginModel {
        session,
        options,
        poisoned: false,
    })
}

impl PluginModel {
    /// Options the model was set up with.
    #[must_use]
    pub fn options(&self) -> &SetupOptions {
        &self.options
    }

    /// Latent dimensionality the model expects.
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.session.latent_dim()
    }

    /// `generate` callback: one image for `{z, truncation}`.
    ///
    /// Noise is reseeded from the setup seed before each call, so equal
    /// inputs give equal images.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input, or if inference fails. After an
    /// inference failure every later call fails too.
    pub async fn generate(&mut self, input: &Value) -> Result<GenerateOutput, PluginError> {
        if self.poisoned {
            return Err(PluginError::Provider(ProviderError::Unusable));
        }
        let input: GenerateInput = serde_json::from_value(input.clone())
            .map_err(|e| PluginError::Input(e.to_string()))?;
        let request = decode_vector(input.z, input.truncation, self.session.latent_dim())?;
        match self.session.generate(&request).await {
            Ok(image) => Ok(GenerateOutput { image }),
            Err(e) => {
                self.poisoned = true;
                Err(e.into())
            }
        }
    }
}
