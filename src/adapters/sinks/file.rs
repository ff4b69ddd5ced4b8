//! File sink: overwrite one image file per generation.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SinkError;
use crate::output::save_image;
use crate::ports::{GenerationResult, ResponseSink};

/// Writes every result to the same path. No history is kept.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    released: bool,
}

impl FileSink {
    /// Create a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseSink for FileSink {
    fn deliver(&mut self, result: GenerationResult) -> Result<(), SinkError> {
        if self.released {
            return Err(SinkError::Released);
        }
        save_image(&result, &self.path)?;
        info!(path = %self.path.display(), "saved");
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
