//! Local procedural generator loaded from a descriptor file.
//!
//! The descriptor is a small JSON document:
//!
//! ```json
//! { "latent_dim": 512, "width": 256, "height": 256, "noise_strength": 6.0 }
//! ```
//!
//! Output is a sum of sinusoidal bands whose amplitude, frequency and phase
//! come from the truncated latent, plus per-pixel noise drawn from the
//! provider's noise state. The same latent, psi and noise seed always give
//! the same image.

use std::f32::consts::TAU;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, StartupError};
use crate::latent::truncate;
use crate::ports::{GenerateFuture, GenerationResult, InferenceProvider};

/// Sinusoidal bands per colour channel.
const BANDS: usize = 8;
/// Latent components consumed per band.
const BAND_PARAMS: usize = 4;
/// Largest accepted width or height.
const MAX_SIDE: u32 = 4096;

fn default_noise_strength() -> f32 {
    6.0
}

/// Generator descriptor read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorDescriptor {
    /// Latent dimensionality.
    pub latent_dim: usize,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Peak amplitude of per-pixel noise, in 8-bit levels.
    #[serde(default = "default_noise_strength")]
    pub noise_strength: f32,
}

impl GeneratorDescriptor {
    fn validate(&self) -> Result<(), String> {
        if self.latent_dim == 0 {
            return Err("latent_dim must be positive".into());
        }
        if self.width == 0 || self.height == 0 || self.width > MAX_SIDE || self.height > MAX_SIDE {
            return Err(format!(
                "image size {}x{} must be within 1..={MAX_SIDE}",
                self.width, self.height
            ));
        }
        if !self.noise_strength.is_finite() || self.noise_strength < 0.0 {
            return Err(format!("noise_strength {} must be >= 0", self.noise_strength));
        }
        Ok(())
    }
}

/// Deterministic procedural image generator.
#[derive(Debug)]
pub struct SyntheticProvider {
    descriptor: GeneratorDescriptor,
    noise: ChaCha8Rng,
}

impl SyntheticProvider {
    /// Build a provider from an in-memory descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is out of range.
    pub fn new(descriptor: GeneratorDescriptor) -> Result<Self, StartupError> {
        if let Err(reason) = descriptor.validate() {
            return Err(StartupError::Artifact {
                path: "<inline>".into(),
                reason,
            });
        }
        Ok(Self {
            descriptor,
            noise: ChaCha8Rng::seed_from_u64(0),
        })
    }

    /// Load a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable, or out of range.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let artifact_err = |reason: String| StartupError::Artifact {
            path: path.display().to_string(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| artifact_err(e.to_string()))?;
        let descriptor: GeneratorDescriptor =
            serde_json::from_str(&contents).map_err(|e| artifact_err(e.to_string()))?;
        descriptor.validate().map_err(artifact_err)?;
        debug!(
            path = %path.display(),
            latent_dim = descriptor.latent_dim,
            width = descriptor.width,
            height = descriptor.height,
            "loaded generator descriptor"
        );
        Ok(Self {
            descriptor,
            noise: ChaCha8Rng::seed_from_u64(0),
        })
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn synthesize(&mut self, latent: &[f32]) -> Result<GenerationResult, ProviderError> {
        let (width, height) = (self.descriptor.width, self.descriptor.height);
        let noise_strength = self.descriptor.noise_strength;
        let bands = band_params(latent);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);

        for y in 0..height {
            let v = y as f32 / height as f32;
            for x in 0..width {
                let u = x as f32 / width as f32;
                for channel in &bands {
                    let signal: f32 = channel
                        .iter()
                        .map(|b| b.amplitude * (TAU * (b.fx * u + b.fy * v) + b.phase).sin())
                        .sum();
                    let noise = if noise_strength > 0.0 {
                        self.noise.gen_range(-noise_strength..=noise_strength)
                    } else {
                        0.0
                    };
                    let level = 127.5 + 127.5 * (signal / 2.0).tanh() + noise;
                    pixels.push(level.round().clamp(0.0, 255.0) as u8);
                }
            }
        }

        GenerationResult::from_rgb(width, height, pixels)
    }
}

#[derive(Debug, Clone, Copy)]
struct Band {
    amplitude: f32,
    fx: f32,
    fy: f32,
    phase: f32,
}

/// Slice the latent into three channels of bands, cycling if it is short.
fn band_params(latent: &[f32]) -> [[Band; BANDS]; 3] {
    let at = |i: usize| latent[i % latent.len()];
    std::array::from_fn(|c| {
        std::array::from_fn(|b| {
            let base = (c * BANDS + b) * BAND_PARAMS;
            Band {
                amplitude: at(base) / 2.0,
                fx: at(base + 1) * 3.0,
                fy: at(base + 2) * 3.0,
                phase: at(base + 3) * std::f32::consts::PI,
            }
        })
    })
}

impl InferenceProvider for SyntheticProvider {
    fn latent_dim(&self) -> usize {
        self.descriptor.latent_dim
    }

    fn reseed_noise(&mut self, seed: u64) {
        self.noise = ChaCha8Rng::seed_from_u64(seed);
    }

    fn generate<'a>(&'a mut self, latent: &'a [f32], psi: f32) -> GenerateFuture<'a> {
        Box::pin(async move {
            let expected = self.descriptor.latent_dim;
            if latent.len() != expected {
                return Err(ProviderError::Dimension {
                    expected,
                    got: latent.len(),
                });
            }
            let truncated = truncate(latent, psi);
            self.synthesize(&truncated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latent::latent_from_seed;

    fn small() -> SyntheticProvider {
        SyntheticProvider::new(GeneratorDescriptor {
            latent_dim: 16,
            width: 8,
            height: 6,
            noise_strength: 6.0,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn output_has_descriptor_size() {
        let mut provider = small();
        let z = latent_from_seed(1, 16);
        let img = provider.generate(&z, 1.0).await.unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
        assert_eq!(img.pixels().len(), 8 * 6 * 3);
    }

    #[tokio::test]
    async fn reseeding_makes_output_reproducible() {
        let mut provider = small();
        let z = latent_from_seed(42, 16);

        provider.reseed_noise(42);
        let first = provider.generate(&z, 0.7).await.unwrap();
        provider.reseed_noise(42);
        let second = provider.generate(&z, 0.7).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn noise_state_advances_without_reseed() {
        let mut provider = small();
        let z = latent_from_seed(42, 16);

        provider.reseed_noise(42);
        let first = provider.generate(&z, 0.7).await.unwrap();
        let second = provider.generate(&z, 0.7).await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn different_latents_give_different_images() {
        let mut provider = small();
        let (z1, z2) = (latent_from_seed(1, 16), latent_from_seed(2, 16));
        provider.reseed_noise(0);
        let a = provider.generate(&z1, 1.0).await.unwrap();
        provider.reseed_noise(0);
        let b = provider.generate(&z2, 1.0).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn zero_psi_without_noise_is_flat_grey() {
        let mut provider = SyntheticProvider::new(GeneratorDescriptor {
            latent_dim: 4,
            width: 2,
            height: 2,
            noise_strength: 0.0,
        })
        .unwrap();
        let img = provider.generate(&[1.0, 2.0, 3.0, 4.0], 0.0).await.unwrap();
        assert!(img.pixels().iter().all(|&p| p == 128));
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let mut provider = small();
        let err = provider.generate(&[0.0; 3], 1.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Dimension { expected: 16, .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, r#"{"latent_dim": 512, "width": 64, "height": 32}"#).unwrap();

        let provider = SyntheticProvider::load(&path).unwrap();
        assert_eq!(provider.latent_dim(), 512);
        assert!((provider.descriptor.noise_strength - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_artifact_is_startup_error() {
        let err = SyntheticProvider::load(Path::new("/nonexistent/network.json")).unwrap_err();
        assert!(matches!(err, StartupError::Artifact { .. }));
    }

    #[test]
    fn corrupt_artifact_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(SyntheticProvider::load(&path).is_err());

        std::fs::write(&path, r#"{"latent_dim": 0, "width": 64, "height": 32}"#).unwrap();
        assert!(SyntheticProvider::load(&path).is_err());
    }
}
