//! ffmpeg single-frame thumbnail adapter

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{ThumbnailError, ThumbnailGenerator};
use crate::domain::clip::Clip;

use super::last_line;

/// Preview image size in pixels
pub const THUMBNAIL_SIZE: (u32, u32) = (320, 180);

/// Grabs one frame near the start of the clip
#[derive(Debug)]
pub struct FfmpegThumbnailer {
    size: (u32, u32),
}

impl FfmpegThumbnailer {
    pub fn new() -> Self {
        Self {
            size: THUMBNAIL_SIZE,
        }
    }

    /// One second in, or the midpoint of shorter clips
    fn seek_offset(duration_secs: f64) -> f64 {
        if duration_secs.is_finite() && duration_secs > 0.0 {
            (duration_secs / 2.0).min(1.0)
        } else {
            0.0
        }
    }

    fn build_args(&self, clip: &Clip, output: &Path) -> Vec<String> {
        let (width, height) = self.size;
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", Self::seek_offset(clip.duration_secs)),
            "-i".to_string(),
            clip.path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            "-s".to_string(),
            format!("{}x{}", width, height),
            output.to_string_lossy().to_string(),
        ]
    }
}

impl Default for FfmpegThumbnailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThumbnailGenerator for FfmpegThumbnailer {
    async fn generate(&self, clip: &Clip, output: &Path) -> Result<(), ThumbnailError> {
        let result = Command::new("ffmpeg")
            .args(self.build_args(clip, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ThumbnailError::ToolNotFound("ffmpeg".to_string())
                } else {
                    ThumbnailError::Failed(e.to_string())
                }
            })?;

        if !result.status.success() {
            return Err(ThumbnailError::Failed(last_line(&result.stderr)));
        }
        Ok(())
    }
}
