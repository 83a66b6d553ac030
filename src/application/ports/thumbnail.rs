//! Thumbnail generator port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::clip::Clip;

/// Thumbnail errors
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    #[error("Thumbnail tool not found: {0}")]
    ToolNotFound(String),

    #[error("Thumbnail generation failed: {0}")]
    Failed(String),

    #[error("Failed to prepare thumbnail directory: {0}")]
    Io(String),
}

/// Port for deriving a preview image from a clip
#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    /// Write a preview image for `clip` to `output`
    async fn generate(&self, clip: &Clip, output: &Path) -> Result<(), ThumbnailError>;
}
