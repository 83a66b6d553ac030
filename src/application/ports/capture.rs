//! Capture backend port interfaces

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Child;

use crate::domain::capture::{BackendSelectionError, CaptureBackendKind};

/// Capture process errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Capture tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to spawn capture process: {0}")]
    SpawnFailed(String),

    #[error("Failed to signal capture process: {0}")]
    SignalFailed(String),
}

/// Port for one external screen capture tool.
///
/// The backend only knows how to launch and politely stop its tool; the
/// recording session owns the returned process for its whole lifetime.
pub trait CaptureBackend: Send + Sync {
    /// Which tool this backend drives
    fn kind(&self) -> CaptureBackendKind;

    /// Human-readable backend name for status output
    fn name(&self) -> String {
        self.kind().to_string()
    }

    /// Spawn the capture process writing to `output`.
    ///
    /// The process must run until signalled and must be killed if the
    /// handle is dropped.
    fn start(&self, output: &Path) -> Result<Child, CaptureError>;

    /// Ask the process to finalize its container and exit.
    fn request_stop(&self, child: &Child) -> Result<(), CaptureError>;
}

/// Port resolving the backend to use for the next recording
#[async_trait]
pub trait BackendResolver: Send + Sync {
    /// Resolve a backend from the current environment.
    ///
    /// Called once per recording start; the result is not re-evaluated
    /// while that recording runs.
    async fn resolve(&self) -> Result<Arc<dyn CaptureBackend>, BackendSelectionError>;

    /// Backend to retry with once when `failed` exits inside the startup
    /// window. `None` makes the failure final.
    async fn fallback(&self, _failed: CaptureBackendKind) -> Option<Arc<dyn CaptureBackend>> {
        None
    }
}
