//! Asynchronous thumbnail jobs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::clip::Clip;

use super::clip_store::ClipStore;
use super::ports::{ThumbnailError, ThumbnailGenerator};

/// Subdirectory of the recordings directory holding preview images
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Derives preview images for clips, one task per clip.
///
/// Jobs may finish in any order. A job that completes after its clip was
/// deleted drops the write and removes the orphaned image.
#[derive(Clone)]
pub struct ThumbnailService {
    generator: Arc<dyn ThumbnailGenerator>,
    store: Arc<ClipStore>,
}

impl ThumbnailService {
    pub fn new(generator: Arc<dyn ThumbnailGenerator>, store: Arc<ClipStore>) -> Self {
        Self { generator, store }
    }

    /// Image path for a clip: `<clip dir>/thumbnails/<file name>.png`
    pub fn thumbnail_path(clip: &Clip) -> PathBuf {
        let dir = clip.path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(THUMBNAIL_DIR)
            .join(format!("{}.png", clip.file_name()))
    }

    /// Generate in the background; failures are logged, never fatal
    pub fn request(&self, clip: Clip) -> JoinHandle<Result<Option<PathBuf>, ThumbnailError>> {
        let service = self.clone();
        tokio::spawn(async move {
            let result = service.generate(&clip).await;
            if let Err(e) = &result {
                warn!("Thumbnail for {} not generated: {}", clip.path.display(), e);
            }
            result
        })
    }

    /// Generate now and attach the image to the clip.
    ///
    /// `Ok(None)` means the clip was removed while the image was rendered;
    /// the write is dropped and the image deleted.
    pub async fn generate(&self, clip: &Clip) -> Result<Option<PathBuf>, ThumbnailError> {
        let output = Self::thumbnail_path(clip);
        if let Some(dir) = output.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| ThumbnailError::Io(format!("{}: {}", dir.display(), e)))?;
        }

        self.generator.generate(clip, &output).await?;

        if !self.store.set_thumbnail(&clip.path, &output).await {
            debug!("Discarding thumbnail for removed clip {}", clip.path.display());
            let _ = fs::remove_file(&output).await;
            return Ok(None);
        }

        Ok(Some(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MediaProbe, ProbeError};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedProbe;

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn duration(&self, _path: &Path) -> Result<f64, ProbeError> {
            Ok(4.0)
        }
    }

    struct WritingGenerator {
        delay: Duration,
    }

    #[async_trait]
    impl ThumbnailGenerator for WritingGenerator {
        async fn generate(&self, _clip: &Clip, output: &Path) -> Result<(), ThumbnailError> {
            tokio::time::sleep(self.delay).await;
            std::fs::write(output, b"png").map_err(|e| ThumbnailError::Failed(e.to_string()))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ThumbnailGenerator for FailingGenerator {
        async fn generate(&self, _clip: &Clip, _output: &Path) -> Result<(), ThumbnailError> {
            Err(ThumbnailError::Failed("no frames".to_string()))
        }
    }

    async fn setup(dir: &TempDir) -> (Arc<ClipStore>, Clip) {
        let store = Arc::new(ClipStore::open(dir.path(), Arc::new(FixedProbe)).await.unwrap());
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, b"video").unwrap();
        let clip = store.register(&path, None).await.unwrap();
        (store, clip)
    }

    #[test]
    fn thumbnail_path_sits_next_to_clip() {
        let clip = Clip::new(PathBuf::from("/rec/a.mp4"), chrono::Utc::now(), 1.0, 1);
        assert_eq!(
            ThumbnailService::thumbnail_path(&clip),
            PathBuf::from("/rec/thumbnails/a.mp4.png")
        );
    }

    #[tokio::test]
    async fn generated_thumbnail_is_attached() {
        let dir = TempDir::new().unwrap();
        let (store, clip) = setup(&dir).await;
        let service = ThumbnailService::new(
            Arc::new(WritingGenerator {
                delay: Duration::ZERO,
            }),
            Arc::clone(&store),
        );

        let image = service.request(clip.clone()).await.unwrap().unwrap().unwrap();
        assert!(image.exists());
        assert_eq!(store.get(&clip.path).unwrap().thumbnail, Some(image));
    }

    #[tokio::test]
    async fn late_thumbnail_for_deleted_clip_is_dropped() {
        let dir = TempDir::new().unwrap();
        let (store, clip) = setup(&dir).await;
        let service = ThumbnailService::new(
            Arc::new(WritingGenerator {
                delay: Duration::from_millis(200),
            }),
            Arc::clone(&store),
        );

        let job = service.request(clip.clone());
        store.delete(&clip.path).await.unwrap();

        let outcome = job.await.unwrap().unwrap();
        assert_eq!(outcome, None);
        assert!(!ThumbnailService::thumbnail_path(&clip).exists());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn generator_failure_leaves_clip_without_thumbnail() {
        let dir = TempDir::new().unwrap();
        let (store, clip) = setup(&dir).await;
        let service = ThumbnailService::new(Arc::new(FailingGenerator), Arc::clone(&store));

        assert!(service.generate(&clip).await.is_err());
        assert!(store.get(&clip.path).unwrap().thumbnail.is_none());
    }
}
