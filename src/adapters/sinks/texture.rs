//! Shared-frame publisher standing in for a GPU texture sender.
//!
//! A sender has a name and a fixed size. Each published frame is resized to
//! that size and swapped into `<dir>/<name>.frame` with an atomic rename, so a
//! reader never sees a half-written frame. Layout:
//!
//! | bytes | content                  |
//! |-------|--------------------------|
//! | 0..8  | magic `LBFRAME1`         |
//! | 8..12 | width, u32 little-endian |
//! | 12..16| height, u32 little-endian|
//! | 16..  | RGB8 pixels, row-major   |

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use tracing::{debug, warn};

use crate::error::{SinkError, StartupError};
use crate::ports::{GenerationResult, ResponseSink};

/// Frame file magic.
pub const FRAME_MAGIC: &[u8; 8] = b"LBFRAME1";
/// Header length in bytes.
pub const FRAME_HEADER_LEN: usize = 16;

/// Publishes frames under a fixed sender name and size.
#[derive(Debug)]
pub struct TexturePublisher {
    name: String,
    width: u32,
    height: u32,
    frame_path: PathBuf,
    released: bool,
}

impl TexturePublisher {
    /// Create a sender. The directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero, the name is not a plain file
    /// name, or the directory cannot be created.
    pub fn create(name: &str, width: u32, height: u32, dir: &Path) -> Result<Self, StartupError> {
        let resource_err = |reason: String| StartupError::Resource {
            what: "texture sender",
            reason,
        };
        if width == 0 || height == 0 {
            return Err(resource_err(format!("invalid sender size {width}x{height}")));
        }
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(resource_err(format!("invalid sender name '{name}'")));
        }
        std::fs::create_dir_all(dir)
            .map_err(|e| resource_err(format!("{}: {e}", dir.display())))?;
        let frame_path = dir.join(format!("{name}.frame"));
        debug!(
            sender = name,
            width,
            height,
            path = %frame_path.display(),
            "created texture sender"
        );
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            frame_path,
            released: false,
        })
    }

    /// Path frames are published to.
    #[must_use]
    pub fn frame_path(&self) -> &Path {
        &self.frame_path
    }

    fn encode(&self, result: GenerationResult) -> Vec<u8> {
        let img = if (result.width(), result.height()) == (self.width, self.height) {
            result.into_rgb_image()
        } else {
            imageops::resize(
                &result.into_rgb_image(),
                self.width,
                self.height,
                FilterType::Triangle,
            )
        };
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + img.as_raw().len());
        frame.extend_from_slice(FRAME_MAGIC);
        frame.extend_from_slice(&self.width.to_le_bytes());
        frame.extend_from_slice(&self.height.to_le_bytes());
        frame.extend_from_slice(img.as_raw());
        frame
    }
}

impl ResponseSink for TexturePublisher {
    fn deliver(&mut self, result: GenerationResult) -> Result<(), SinkError> {
        if self.released {
            return Err(SinkError::Released);
        }
        let frame = self.encode(result);
        let staging = self.frame_path.with_extension("frame.tmp");
        let io_err = |path: &Path, source| SinkError::Io {
            path: path.display().to_string(),
            source,
        };
        std::fs::write(&staging, &frame).map_err(|e| io_err(&staging, e))?;
        std::fs::rename(&staging, &self.frame_path).map_err(|e| io_err(&self.frame_path, e))?;
        debug!(sender = %self.name, bytes = frame.len(), "published frame");
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.frame_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(sender = %self.name, error = %e, "failed to remove published frame"),
        }
    }

    fn describe(&self) -> String {
        format!("texture '{}' {}x{}", self.name, self.width, self.height)
    }
}

impl Drop for TexturePublisher {
    fn drop(&mut self) {
        self.release();
    }
}

/// Read a published frame back: `(width, height, pixels)`.
///
/// # Errors
///
/// Returns an error if the file is missing or not a frame.
pub fn read_frame(path: &Path) -> Result<(u32, u32, Vec<u8>), std::io::Error> {
    let bytes = std::fs::read(path)?;
    let invalid = |msg: &str| std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string());
    if bytes.len() < FRAME_HEADER_LEN || &bytes[..8] != FRAME_MAGIC {
        return Err(invalid("not a frame file"));
    }
    let width = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let height = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let pixels = bytes[FRAME_HEADER_LEN..].to_vec();
    if pixels.len() != width as usize * height as usize * 3 {
        return Err(invalid("frame size does not match header"));
    }
    Ok((width, height, pixels))
}
