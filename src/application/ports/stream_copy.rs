//! Stream copy (lossless trim) port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::clip::TrimRange;

/// Stream copy errors
#[derive(Debug, Clone, Error)]
pub enum StreamCopyError {
    #[error("Trim tool not found: {0}")]
    ToolNotFound(String),

    #[error("Trim tool exited with {}: {stderr}", describe_exit(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to run trim tool: {0}")]
    Io(String),
}

/// Format an optional exit code for messages
pub(crate) fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}

/// Port for copying a time range of a container without re-encoding.
///
/// Implementations cut at keyframes, so the output may start earlier than
/// requested.
#[async_trait]
pub trait StreamCopier: Send + Sync {
    /// Copy `range` of `input` into a new file at `output`
    async fn copy_range(
        &self,
        input: &Path,
        range: TrimRange,
        output: &Path,
    ) -> Result<(), StreamCopyError>;
}
