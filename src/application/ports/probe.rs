//! Media probe port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Media probe errors
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("Probe tool not found: {0}")]
    ToolNotFound(String),

    #[error("Could not read media duration: {0}")]
    Unreadable(String),
}

/// Port for reading container metadata
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration of the media file in seconds
    async fn duration(&self, path: &Path) -> Result<f64, ProbeError>;
}
