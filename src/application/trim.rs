//! Stream-copy trim use case

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::domain::clip::{Clip, TrimRange};
use crate::domain::error::{ErrorCategory, InvalidTrimRange};
use crate::domain::recording::unique_path;

use super::clip_store::{ClipStore, ClipStoreError};
use super::ports::stream_copy::describe_exit;
use super::ports::{StreamCopier, StreamCopyError};
use super::thumbnails::ThumbnailService;

/// Errors from the trim use case
#[derive(Debug, Clone, Error)]
pub enum TrimError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidTrimRange),

    #[error("Source clip is missing: {0}")]
    SourceMissing(String),

    #[error("Trim tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Trim failed with {}: {message}", describe_exit(.exit_code))]
    ExternalToolFailure {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Trim produced an empty file")]
    EmptyOutput,

    #[error("Failed to register trimmed clip: {0}")]
    Register(#[from] ClipStoreError),
}

impl TrimError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRange(_) | Self::ToolUnavailable(_) => ErrorCategory::Configuration,
            Self::SourceMissing(_) | Self::Register(_) => ErrorCategory::FileSystem,
            Self::ExternalToolFailure { .. } | Self::EmptyOutput => ErrorCategory::ExternalTool,
        }
    }
}

impl From<StreamCopyError> for TrimError {
    fn from(err: StreamCopyError) -> Self {
        match err {
            StreamCopyError::ToolNotFound(tool) => Self::ToolUnavailable(tool),
            StreamCopyError::Failed { exit_code, stderr } => Self::ExternalToolFailure {
                exit_code,
                message: stderr,
            },
            StreamCopyError::Io(message) => Self::ExternalToolFailure {
                exit_code: None,
                message,
            },
        }
    }
}

/// Produces new clips from a time range of an existing one.
///
/// The source file is never modified. Cuts snap to keyframes, so the new
/// clip's duration is whatever the probe reports for the output.
pub struct TrimEngine {
    store: Arc<ClipStore>,
    copier: Arc<dyn StreamCopier>,
    thumbnails: Option<ThumbnailService>,
}

impl TrimEngine {
    pub fn new(
        store: Arc<ClipStore>,
        copier: Arc<dyn StreamCopier>,
        thumbnails: Option<ThumbnailService>,
    ) -> Self {
        Self {
            store,
            copier,
            thumbnails,
        }
    }

    /// Trim `clip` to `[start, end)` seconds and register the result
    pub async fn trim(&self, clip: &Clip, start: f64, end: f64) -> Result<Clip, TrimError> {
        let range = TrimRange::new(start, end, clip.duration_secs)?;
        Self::ensure_source(clip).await?;

        let trimmed = self.cut(clip, range, &Self::output_path(&clip.path)).await?;
        info!(
            path = %trimmed.path.display(),
            duration = trimmed.duration_secs,
            "Trimmed clip"
        );
        self.request_thumbnail(&trimmed);
        Ok(trimmed)
    }

    /// Split `clip` at `at` seconds into `<stem>_part1` and `<stem>_part2`.
    ///
    /// Both halves are new clips; if the second cut fails the first is
    /// removed again.
    pub async fn split(&self, clip: &Clip, at: f64) -> Result<(Clip, Clip), TrimError> {
        let head = TrimRange::new(0.0, at, clip.duration_secs)?;
        let tail = TrimRange::new(at, clip.duration_secs, clip.duration_secs)?;
        Self::ensure_source(clip).await?;

        let (first_path, second_path) = Self::split_paths(&clip.path);
        let first = self.cut(clip, head, &first_path).await?;
        let second = match self.cut(clip, tail, &second_path).await {
            Ok(second) => second,
            Err(e) => {
                if let Err(undo) = self.store.delete(&first.path).await {
                    warn!("Could not remove first half of failed split: {}", undo);
                }
                return Err(e);
            }
        };

        info!(
            first = %first.path.display(),
            second = %second.path.display(),
            at,
            "Split clip"
        );
        self.request_thumbnail(&first);
        self.request_thumbnail(&second);
        Ok((first, second))
    }

    async fn ensure_source(clip: &Clip) -> Result<(), TrimError> {
        if fs::try_exists(&clip.path).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(TrimError::SourceMissing(clip.path.display().to_string()))
        }
    }

    /// Stream-copy `range` of `clip` into `output` and register it
    async fn cut(&self, clip: &Clip, range: TrimRange, output: &Path) -> Result<Clip, TrimError> {
        self.store.mark_pending(output);

        debug!(
            source = %clip.path.display(),
            output = %output.display(),
            start = range.start(),
            end = range.end(),
            "Cutting clip"
        );

        if let Err(e) = self.copier.copy_range(&clip.path, range, output).await {
            self.discard(output).await;
            return Err(e.into());
        }

        let size = fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            self.discard(output).await;
            return Err(TrimError::EmptyOutput);
        }

        match self.store.register(output, Some(range.length())).await {
            Ok(cut) => Ok(cut),
            Err(e) => {
                self.discard(output).await;
                Err(e.into())
            }
        }
    }

    fn request_thumbnail(&self, clip: &Clip) {
        if let Some(thumbnails) = &self.thumbnails {
            thumbnails.request(clip.clone());
        }
    }

    async fn discard(&self, output: &Path) {
        let _ = fs::remove_file(output).await;
        self.store.clear_pending(output);
    }

    /// `<stem>_trim_<unix seconds>.<ext>` next to the source
    fn output_path(source: &Path) -> PathBuf {
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip".to_string());
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp4".to_string());
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        unique_path(dir, &format!("{}_trim_{}.{}", stem, stamp, ext), |p| {
            p.exists()
        })
    }

    /// `<stem>_part1.<ext>` and `<stem>_part2.<ext>`, sharing a `_N` suffix
    /// when either name is taken
    fn split_paths(source: &Path) -> (PathBuf, PathBuf) {
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip".to_string());
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let pair = |suffix: String| {
            (
                dir.join(format!("{}_part1{}{}", stem, suffix, ext)),
                dir.join(format!("{}_part2{}{}", stem, suffix, ext)),
            )
        };

        let mut paths = pair(String::new());
        let mut index = 1u32;
        while paths.0.exists() || paths.1.exists() {
            paths = pair(format!("_{}", index));
            index += 1;
        }
        paths
    }
}
