//! Latent vector construction.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::ports::Latent;

/// Expand an integer seed into `dim` standard-normal samples.
///
/// The same seed always yields the same vector.
#[must_use]
pub fn latent_from_seed(seed: u32, dim: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    (0..dim).map(|_| StandardNormal.sample(&mut rng)).collect()
}

/// Resolve a request latent into a concrete vector for a provider of `dim` components.
#[must_use]
pub fn resolve(latent: &Latent, dim: usize) -> Vec<f32> {
    match latent {
        Latent::Seed(seed) => latent_from_seed(*seed, dim),
        Latent::Vector(v) => v.clone(),
    }
}

/// Pull `latent` toward the mean (the origin) by `psi`.
///
/// `psi = 1` leaves it unchanged, `psi = 0` collapses it to the mean.
#[must_use]
pub fn truncate(latent: &[f32], psi: f32) -> Vec<f32> {
    latent.iter().map(|x| x * psi).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_vector() {
        assert_eq!(latent_from_seed(42, 512), latent_from_seed(42, 512));
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(latent_from_seed(1, 16), latent_from_seed(2, 16));
    }

    #[test]
    fn length_matches_dim() {
        assert_eq!(latent_from_seed(0, 512).len(), 512);
        assert!(latent_from_seed(0, 0).is_empty());
    }

    #[test]
    fn samples_look_standard_normal() {
        let v = latent_from_seed(1234, 4096);
        #[allow(clippy::cast_precision_loss)]
        let n = v.len() as f32;
        let mean = v.iter().sum::<f32>() / n;
        let var = v.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n;
        assert!(mean.abs() < 0.1, "mean {mean}");
        assert!((var - 1.0).abs() < 0.15, "variance {var}");
    }

    #[test]
    fn vector_latent_passes_through() {
        let v = vec![0.5, -1.0, 2.0];
        assert_eq!(resolve(&Latent::Vector(v.clone()), 3), v);
    }

    #[test]
    fn truncation_scales_toward_mean() {
        assert_eq!(truncate(&[2.0, -4.0], 0.5), vec![1.0, -2.0]);
        assert_eq!(truncate(&[2.0, -4.0], 0.0), vec![0.0, 0.0]);
    }
}
