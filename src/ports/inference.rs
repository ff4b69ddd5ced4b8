//! Inference provider port: latent vector in, RGB image out.

use std::future::Future;
use std::pin::Pin;

use image::RgbImage;

use crate::error::ProviderError;

/// Where the latent vector of a request comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Latent {
    /// Expand deterministically from an integer seed.
    Seed(u32),
    /// Use this vector as-is.
    Vector(Vec<f32>),
}

/// A validated request to generate one image.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Source of the latent vector.
    pub latent: Latent,
    /// Truncation override; `None` uses the session value.
    pub truncation: Option<f32>,
}

impl GenerationRequest {
    /// Request an image for an integer seed.
    #[must_use]
    pub fn seed(seed: u32) -> Self {
        Self {
            latent: Latent::Seed(seed),
            truncation: None,
        }
    }
}

/// A generated RGB image. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl GenerationResult {
    /// Wrap a row-major RGB8 buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length is not `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ProviderError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected || expected == 0 {
            return Err(ProviderError::MalformedOutput(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGB bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Convert into an `image` buffer, consuming the result.
    #[must_use]
    pub fn into_rgb_image(self) -> RgbImage {
        // Length was checked in `from_rgb`.
        RgbImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| RgbImage::new(0, 0))
    }
}

impl From<RgbImage> for GenerationResult {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}

/// Boxed future type returned by [`InferenceProvider::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GenerationResult, ProviderError>> + Send + 'a>>;

/// A loaded generative model.
///
/// Calls take `&mut self`: the provider is not reentrant and is owned by
/// exactly one caller at a time.
pub trait InferenceProvider: Send {
    /// Number of components the latent vector must have.
    fn latent_dim(&self) -> usize;

    /// Reset the internal noise state. Called immediately before each generation.
    fn reseed_noise(&mut self, seed: u64);

    /// Generate one image from `latent` with truncation `psi`.
    fn generate<'a>(&'a mut self, latent: &'a [f32], psi: f32) -> GenerateFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_checks_length() {
        assert!(GenerationResult::from_rgb(2, 2, vec![0; 12]).is_ok());
        assert!(GenerationResult::from_rgb(2, 2, vec![0; 11]).is_err());
        assert!(GenerationResult::from_rgb(0, 0, Vec::new()).is_err());
    }

    #[test]
    fn rgb_image_conversion_keeps_pixels() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(1, 0, image::Rgb([10, 20, 30]));
        let result = GenerationResult::from(img);
        assert_eq!(result.width(), 3);
        assert_eq!(result.height(), 1);
        assert_eq!(&result.pixels()[3..6], &[10, 20, 30]);

        let back = result.into_rgb_image();
        assert_eq!(back.get_pixel(1, 0), &image::Rgb([10, 20, 30]));
    }

    #[test]
    fn seed_request_has_no_truncation_override() {
        let req = GenerationRequest::seed(7);
        assert_eq!(req.latent, Latent::Seed(7));
        assert!(req.truncation.is_none());
    }
}
