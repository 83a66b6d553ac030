//! ffmpeg stream-copy trim adapter

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{StreamCopier, StreamCopyError};
use crate::domain::clip::TrimRange;

use super::last_line;

/// Trims with `ffmpeg -c copy` (no re-encode, keyframe-aligned cuts)
#[derive(Debug, Default)]
pub struct FfmpegStreamCopier;

impl FfmpegStreamCopier {
    pub fn new() -> Self {
        Self
    }

    /// Input-side seek, then a length limit
    fn build_args(input: &Path, range: TrimRange, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", range.start()),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-t".to_string(),
            format!("{:.3}", range.length()),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl StreamCopier for FfmpegStreamCopier {
    async fn copy_range(
        &self,
        input: &Path,
        range: TrimRange,
        output: &Path,
    ) -> Result<(), StreamCopyError> {
        let args = Self::build_args(input, range, output);
        debug!("ffmpeg {}", args.join(" "));

        let result = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    StreamCopyError::ToolNotFound("ffmpeg".to_string())
                } else {
                    StreamCopyError::Io(e.to_string())
                }
            })?;

        if !result.status.success() {
            return Err(StreamCopyError::Failed {
                exit_code: result.status.code(),
                stderr: last_line(&result.stderr),
            });
        }

        Ok(())
    }
}
