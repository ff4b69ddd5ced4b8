//! Generation session: the provider plus the defaults applied to each request.

use tracing::debug;

use crate::error::ProviderError;
use crate::latent;
use crate::ports::{GenerationRequest, GenerationResult, InferenceProvider, Latent};

/// Owns the inference provider and runs one generation at a time.
pub struct Session {
    provider: Box<dyn InferenceProvider>,
    truncation: f32,
    default_seed: u32,
    generations: u64,
}

impl Session {
    /// Create a session. `truncation` must already be validated.
    #[must_use]
    pub fn new(provider: Box<dyn InferenceProvider>, truncation: f32, default_seed: u32) -> Self {
        Self {
            provider,
            truncation,
            default_seed,
            generations: 0,
        }
    }

    /// Latent dimensionality of the loaded provider.
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.provider.latent_dim()
    }

    /// Truncation used when a request carries none.
    #[must_use]
    pub fn truncation(&self) -> f32 {
        self.truncation
    }

    /// Replace the session truncation. `psi` must already be validated.
    pub fn set_truncation(&mut self, psi: f32) {
        self.truncation = psi;
    }

    /// Number of completed generations.
    #[must_use]
    pub fn generations(&self) -> u64 {
        self.generations
    }

    /// Generate one image.
    ///
    /// Noise is reseeded right before the call: seed requests use their own
    /// seed, vector requests use the session default seed.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn generate(
        &mut self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ProviderError> {
        let dim = self.provider.latent_dim();
        let noise_seed = match request.latent {
            Latent::Seed(seed) => seed,
            Latent::Vector(_) => self.default_seed,
        };
        let z = latent::resolve(&request.latent, dim);
        let psi = request.truncation.unwrap_or(self.truncation);

        debug!(noise_seed, psi, "generating");
        self.provider.reseed_noise(u64::from(noise_seed));
        let result = self.provider.generate(&z, psi).await?;
        self.generations += 1;
        Ok(result)
    }
}
