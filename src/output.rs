//! Image encoding, decoding and saving.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::ImageFormat;

use crate::error::{ProviderError, SinkError};
use crate::ports::GenerationResult;

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(result: &GenerationResult) -> Result<Vec<u8>, SinkError> {
    let img = result.clone().into_rgb_image();
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| SinkError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Encode an image as a `data:image/png;base64,...` URI.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn png_data_uri(result: &GenerationResult) -> Result<String, SinkError> {
    let png = encode_png(result)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(png);
    Ok(format!("data:image/png;base64,{b64}"))
}

/// Decode a base64 image, with or without a `data:` URI prefix, into RGB.
///
/// # Errors
///
/// Returns an error if the payload is not base64 or not a decodable image.
pub fn decode_image_payload(payload: &str) -> Result<GenerationResult, ProviderError> {
    let b64 = match payload.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| ProviderError::MalformedOutput(format!("Failed to decode base64: {e}")))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| ProviderError::MalformedOutput(format!("Failed to decode image: {e}")))?;
    Ok(GenerationResult::from(img.to_rgb8()))
}

/// Save an image to `path`, overwriting any existing file.
///
/// The format follows the file extension and falls back to PNG.
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_image(result: &GenerationResult, path: &Path) -> Result<(), SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let img = result.clone().into_rgb_image();
    img.save_with_format(path, format).map_err(|e| match e {
        image::ImageError::IoError(source) => io_err(source),
        other => SinkError::Encode(other.to_string()),
    })
}
