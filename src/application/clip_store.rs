//! Clip registry reconciled against the recordings directory

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::domain::clip::{is_media_file, Clip, ClipName};
use crate::domain::error::{ErrorCategory, InvalidClipName};

use super::ports::MediaProbe;

/// File name of the persisted index inside the recordings directory
pub const INDEX_FILE_NAME: &str = ".nova-replay-index.json";

const INDEX_VERSION: u32 = 1;

/// Errors from registry bookkeeping
#[derive(Debug, Clone, Error)]
pub enum ClipStoreError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Clip index at {path} is unreadable: {message}")]
    IndexCorrupt { path: String, message: String },
}

impl ClipStoreError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }

    fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors from [`ClipStore::delete`]
#[derive(Debug, Clone, Error)]
pub enum DeleteError {
    #[error("Clip not found: {0}")]
    NotFound(String),

    #[error("Failed to delete clip: {0}")]
    DeleteFailed(String),
}

impl DeleteError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

/// Errors from [`ClipStore::rename`]
#[derive(Debug, Clone, Error)]
pub enum RenameError {
    #[error("Clip not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidName(#[from] InvalidClipName),

    #[error("A file named {0} already exists")]
    NameCollision(String),

    #[error("Failed to rename clip: {0}")]
    RenameFailed(String),
}

impl RenameError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::FileSystem,
        }
    }
}

/// Errors from [`ClipStore::save_as`]
#[derive(Debug, Clone, Error)]
pub enum CopyError {
    #[error("Clip not found: {0}")]
    NotFound(String),

    #[error("Destination already exists: {0} (use overwrite to replace it)")]
    DestinationExists(String),

    #[error("Destination is the clip itself")]
    SameFile,

    #[error("Failed to copy clip: {0}")]
    CopyFailed(String),
}

impl CopyError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files found on disk with no entry
    pub adopted: Vec<PathBuf>,
    /// Entries whose file is gone
    pub pruned: Vec<PathBuf>,
}

impl ReconcileReport {
    /// True when the pass changed nothing
    pub fn is_empty(&self) -> bool {
        self.adopted.is_empty() && self.pruned.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    clips: Vec<Clip>,
}

#[derive(Default)]
struct Registry {
    clips: HashMap<PathBuf, Clip>,
    /// Files still being written (live capture, trim in progress)
    pending: HashSet<PathBuf>,
}

/// Durable registry of known clips.
///
/// All bookkeeping happens under one lock; filesystem work is done outside
/// it and the lock is re-acquired only to commit.
pub struct ClipStore {
    directory: PathBuf,
    index_path: PathBuf,
    probe: Arc<dyn MediaProbe>,
    registry: Mutex<Registry>,
    persist_lock: tokio::sync::Mutex<()>,
    /// Held across delete and rename so a file never moves under a delete
    moves: tokio::sync::Mutex<()>,
}

impl ClipStore {
    /// Open the store for `directory`, loading its index.
    ///
    /// A missing index is an empty registry. A corrupt index is logged and
    /// ignored; the next [`reconcile`](Self::reconcile) re-adopts every file.
    pub async fn open(
        directory: impl Into<PathBuf>,
        probe: Arc<dyn MediaProbe>,
    ) -> Result<Self, ClipStoreError> {
        let store = Self::empty(directory.into(), probe)?;
        match store.load_index().await {
            Ok(clips) => store.install(clips),
            Err(e @ ClipStoreError::IndexCorrupt { .. }) => {
                warn!("{}; starting with an empty registry", e);
            }
            Err(e) => return Err(e),
        }
        Ok(store)
    }

    /// Like [`open`](Self::open), but a corrupt index is an error
    pub async fn open_strict(
        directory: impl Into<PathBuf>,
        probe: Arc<dyn MediaProbe>,
    ) -> Result<Self, ClipStoreError> {
        let store = Self::empty(directory.into(), probe)?;
        let clips = store.load_index().await?;
        store.install(clips);
        Ok(store)
    }

    fn empty(directory: PathBuf, probe: Arc<dyn MediaProbe>) -> Result<Self, ClipStoreError> {
        let directory = absolute(&directory)?;
        let index_path = directory.join(INDEX_FILE_NAME);
        Ok(Self {
            directory,
            index_path,
            probe,
            registry: Mutex::new(Registry::default()),
            persist_lock: tokio::sync::Mutex::new(()),
            moves: tokio::sync::Mutex::new(()),
        })
    }

    fn install(&self, clips: Vec<Clip>) {
        let mut registry = self.lock();
        for clip in clips {
            registry.clips.insert(clip.path.clone(), clip);
        }
    }

    async fn load_index(&self) -> Result<Vec<Clip>, ClipStoreError> {
        let content = match fs::read_to_string(&self.index_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ClipStoreError::io(&self.index_path, e)),
        };

        let index: IndexFile =
            serde_json::from_str(&content).map_err(|e| ClipStoreError::IndexCorrupt {
                path: self.index_path.display().to_string(),
                message: e.to_string(),
            })?;

        if index.version != INDEX_VERSION {
            return Err(ClipStoreError::IndexCorrupt {
                path: self.index_path.display().to_string(),
                message: format!("unsupported index version {}", index.version),
            });
        }

        Ok(index.clips)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Recordings directory this store persists into
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of registered clips
    pub fn len(&self) -> usize {
        self.lock().clips.len()
    }

    /// True when no clips are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a clip by its path
    pub fn get(&self, id: &Path) -> Option<Clip> {
        self.lock().clips.get(id).cloned()
    }

    /// All clips, newest first; ties broken by path
    pub fn list(&self) -> Vec<Clip> {
        let mut clips: Vec<Clip> = self.lock().clips.values().cloned().collect();
        clips.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.path.cmp(&b.path))
        });
        clips
    }

    /// Exclude a file that is still being written from reconciliation
    pub fn mark_pending(&self, path: &Path) {
        self.lock().pending.insert(path.to_path_buf());
    }

    /// Undo [`mark_pending`](Self::mark_pending) without registering
    pub fn clear_pending(&self, path: &Path) {
        self.lock().pending.remove(path);
    }

    /// Scan `directory`, adopt unknown media files and prune entries whose
    /// file no longer exists.
    pub async fn reconcile(&self, directory: &Path) -> Result<ReconcileReport, ClipStoreError> {
        let directory = absolute(directory)?;
        let (known, pending): (Vec<PathBuf>, HashSet<PathBuf>) = {
            let registry = self.lock();
            (
                registry.clips.keys().cloned().collect(),
                registry.pending.clone(),
            )
        };

        let mut missing = Vec::new();
        for path in &known {
            if !fs::try_exists(path).await.unwrap_or(true) {
                missing.push(path.clone());
            }
        }

        let known: HashSet<PathBuf> = known.into_iter().collect();
        let mut candidates = Vec::new();
        for path in scan_media_files(&directory).await? {
            if known.contains(&path) || pending.contains(&path) {
                continue;
            }
            match self.describe(&path, None).await {
                Ok(clip) => candidates.push(clip),
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            }
        }

        let mut report = ReconcileReport::default();
        {
            let mut registry = self.lock();
            for path in missing {
                if registry.clips.remove(&path).is_some() {
                    report.pruned.push(path);
                }
            }
            for clip in candidates {
                if registry.pending.contains(&clip.path) || registry.clips.contains_key(&clip.path) {
                    continue;
                }
                report.adopted.push(clip.path.clone());
                registry.clips.insert(clip.path.clone(), clip);
            }
        }
        report.adopted.sort();
        report.pruned.sort();

        if !report.is_empty() {
            info!(
                adopted = report.adopted.len(),
                pruned = report.pruned.len(),
                "Reconciled {}",
                directory.display()
            );
            self.persist().await;
        }

        Ok(report)
    }

    /// Register a finished file as a clip, replacing any previous entry.
    ///
    /// The duration comes from the probe; `duration_hint` is used when the
    /// probe cannot read the container.
    pub async fn register(
        &self,
        path: &Path,
        duration_hint: Option<f64>,
    ) -> Result<Clip, ClipStoreError> {
        let path = absolute(path)?;
        let clip = self.describe(&path, duration_hint).await;

        let clip = {
            let mut registry = self.lock();
            registry.pending.remove(&path);
            let clip = clip?;
            registry.clips.insert(path.clone(), clip.clone());
            clip
        };

        info!(path = %clip.path.display(), duration = clip.duration_secs, "Registered clip");
        self.persist().await;
        Ok(clip)
    }

    async fn describe(&self, path: &Path, duration_hint: Option<f64>) -> Result<Clip, ClipStoreError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| ClipStoreError::io(path, e))?;
        if !metadata.is_file() {
            return Err(ClipStoreError::io(path, "not a regular file"));
        }

        let created: SystemTime = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or_else(|_| SystemTime::now());

        let duration = match self.probe.duration(path).await {
            Ok(secs) => secs,
            Err(e) => {
                debug!("Probe failed for {}: {}", path.display(), e);
                duration_hint.unwrap_or(0.0)
            }
        };

        Ok(Clip::new(
            path.to_path_buf(),
            DateTime::<Utc>::from(created),
            duration,
            metadata.len(),
        ))
    }

    /// Attach a generated thumbnail.
    ///
    /// Returns `false` (and records nothing) when the clip is gone.
    pub async fn set_thumbnail(&self, id: &Path, thumbnail: &Path) -> bool {
        let updated = {
            let mut registry = self.lock();
            match registry.clips.get_mut(id) {
                Some(clip) => {
                    clip.thumbnail = Some(thumbnail.to_path_buf());
                    true
                }
                None => false,
            }
        };
        if updated {
            self.persist().await;
        }
        updated
    }

    /// Delete the clip's file and its entry.
    ///
    /// A file that is already gone counts as deleted. When the file cannot
    /// be removed the entry is kept.
    pub async fn delete(&self, id: &Path) -> Result<(), DeleteError> {
        let _moving = self.moves.lock().await;
        let clip = self
            .get(id)
            .ok_or_else(|| DeleteError::NotFound(id.display().to_string()))?;

        let file_removed = match fs::remove_file(&clip.path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} was already gone", clip.path.display());
                false
            }
            Err(e) => {
                return Err(DeleteError::DeleteFailed(format!(
                    "{}: {}",
                    clip.path.display(),
                    e
                )))
            }
        };

        let entry_removed = self.lock().clips.remove(&clip.path).is_some();
        if !file_removed && !entry_removed {
            return Err(DeleteError::NotFound(id.display().to_string()));
        }

        if let Some(thumbnail) = &clip.thumbnail {
            let _ = fs::remove_file(thumbnail).await;
        }

        info!(path = %clip.path.display(), "Deleted clip");
        self.persist().await;
        Ok(())
    }

    /// Rename the clip's file within its directory and re-key the entry.
    pub async fn rename(&self, id: &Path, new_name: &str) -> Result<Clip, RenameError> {
        let name = ClipName::parse(new_name)?;
        let _moving = self.moves.lock().await;
        let clip = self
            .get(id)
            .ok_or_else(|| RenameError::NotFound(id.display().to_string()))?;

        let parent = clip.path.parent().unwrap_or(self.directory.as_path());
        let target = parent.join(name.file_name(clip.path.extension()));

        // The clip's own path counts as taken
        let collides = self.lock().clips.contains_key(&target)
            || fs::symlink_metadata(&target).await.is_ok();
        if collides {
            return Err(RenameError::NameCollision(target.display().to_string()));
        }

        move_without_clobber(&clip.path, &target).await?;

        let renamed = {
            let mut registry = self.lock();
            let mut renamed = registry.clips.remove(&clip.path).unwrap_or(clip);
            renamed.relocate(target.clone());
            registry.clips.insert(target, renamed.clone());
            renamed
        };

        info!(path = %renamed.path.display(), "Renamed clip");
        self.persist().await;
        Ok(renamed)
    }

    /// Copy the clip to `destination` without registering the copy.
    ///
    /// When `destination` is an existing directory the clip's file name is
    /// kept. The copy goes through `<dest>.part` so a failure never leaves a
    /// truncated destination behind.
    pub async fn save_as(
        &self,
        id: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, CopyError> {
        let clip = self
            .get(id)
            .ok_or_else(|| CopyError::NotFound(id.display().to_string()))?;

        let destination = if fs::metadata(destination)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            destination.join(clip.file_name())
        } else {
            destination.to_path_buf()
        };

        if destination == clip.path || same_file(&clip.path, &destination).await {
            return Err(CopyError::SameFile);
        }

        if !overwrite && fs::symlink_metadata(&destination).await.is_ok() {
            return Err(CopyError::DestinationExists(
                destination.display().to_string(),
            ));
        }

        let mut partial = destination.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        if let Err(e) = fs::copy(&clip.path, &partial).await {
            let _ = fs::remove_file(&partial).await;
            return Err(CopyError::CopyFailed(format!(
                "{} -> {}: {}",
                clip.path.display(),
                destination.display(),
                e
            )));
        }
        if let Err(e) = fs::rename(&partial, &destination).await {
            let _ = fs::remove_file(&partial).await;
            return Err(CopyError::CopyFailed(format!(
                "{}: {}",
                destination.display(),
                e
            )));
        }

        info!(from = %clip.path.display(), to = %destination.display(), "Exported clip");
        Ok(destination)
    }

    /// Write the index; failures are logged since the directory itself
    /// stays the source of truth.
    async fn persist(&self) {
        if let Err(e) = self.write_index().await {
            warn!("Failed to persist clip index: {}", e);
        }
    }

    async fn write_index(&self) -> Result<(), ClipStoreError> {
        let _guard = self.persist_lock.lock().await;

        if !fs::try_exists(&self.directory).await.unwrap_or(false) {
            debug!(
                "Recordings directory {} is gone; index not written",
                self.directory.display()
            );
            return Ok(());
        }

        let index = IndexFile {
            version: INDEX_VERSION,
            clips: self.list(),
        };
        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| ClipStoreError::io(&self.index_path, e))?;

        let tmp = self.directory.join(format!("{}.tmp", INDEX_FILE_NAME));
        fs::write(&tmp, json)
            .await
            .map_err(|e| ClipStoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.index_path)
            .await
            .map_err(|e| ClipStoreError::io(&self.index_path, e))?;
        Ok(())
    }
}

/// Media files directly inside `directory` (a missing directory is empty)
async fn scan_media_files(directory: &Path) -> Result<Vec<PathBuf>, ClipStoreError> {
    let mut entries = match fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ClipStoreError::io(directory, e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ClipStoreError::io(directory, e))?
    {
        let path = entry.path();
        if !is_media_file(&path) {
            continue;
        }
        match entry.file_type().await {
            Ok(kind) if kind.is_file() => files.push(path),
            _ => {}
        }
    }
    files.sort();
    Ok(files)
}

/// Rename `from` to `to`, refusing to replace an existing file.
///
/// A hard link fails atomically when the target exists; filesystems that
/// cannot link fall back to a plain rename after the caller's check.
async fn move_without_clobber(from: &Path, to: &Path) -> Result<(), RenameError> {
    match fs::hard_link(from, to).await {
        Ok(()) => fs::remove_file(from).await.map_err(|e| {
            RenameError::RenameFailed(format!("{}: {}", from.display(), e))
        }),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(RenameError::NameCollision(to.display().to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(RenameError::RenameFailed(format!(
            "{}: {}",
            from.display(),
            e
        ))),
        Err(_) => fs::rename(from, to).await.map_err(|e| {
            RenameError::RenameFailed(format!("{} -> {}: {}", from.display(), to.display(), e))
        }),
    }
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ClipStoreError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| ClipStoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ProbeError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedProbe(f64);

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn duration(&self, _path: &Path) -> Result<f64, ProbeError> {
            Ok(self.0)
        }
    }

    struct BrokenProbe;

    #[async_trait]
    impl MediaProbe for BrokenProbe {
        async fn duration(&self, path: &Path) -> Result<f64, ProbeError> {
            Err(ProbeError::Unreadable(path.display().to_string()))
        }
    }

    async fn store_in(dir: &TempDir) -> ClipStore {
        ClipStore::open(dir.path(), Arc::new(FixedProbe(10.0)))
            .await
            .unwrap()
    }

    fn write(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn register_uses_probe_duration() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let path = write(&dir, "a.mp4", b"data");

        let clip = store.register(&path, Some(3.0)).await.unwrap();
        assert_eq!(clip.duration_secs, 10.0);
        assert_eq!(clip.size_bytes, 4);
        assert_eq!(store.get(&path), Some(clip));
    }

    #[tokio::test]
    async fn register_falls_back_to_hint() {
        let dir = TempDir::new().unwrap();
        let store = ClipStore::open(dir.path(), Arc::new(BrokenProbe))
            .await
            .unwrap();
        let path = write(&dir, "a.mp4", b"data");

        let clip = store.register(&path, Some(2.5)).await.unwrap();
        assert_eq!(clip.duration_secs, 2.5);
    }

    #[tokio::test]
    async fn register_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let err = store
            .register(&dir.path().join("nope.mp4"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClipStoreError::Io { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn reconcile_skips_pending_and_non_media() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let live = write(&dir, "live.mp4", b"x");
        write(&dir, "notes.txt", b"x");
        write(&dir, "b.mkv.part", b"x");
        std::fs::create_dir(dir.path().join("thumbnails")).unwrap();

        store.mark_pending(&live);
        let report = store.reconcile(dir.path()).await.unwrap();
        assert!(report.is_empty());

        store.clear_pending(&live);
        let report = store.reconcile(dir.path()).await.unwrap();
        assert_eq!(report.adopted, vec![live]);
    }

    #[tokio::test]
    async fn list_orders_newest_first_then_path() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let a = write(&dir, "a.mp4", b"1");
        let b = write(&dir, "b.mp4", b"1");
        store.register(&a, None).await.unwrap();
        store.register(&b, None).await.unwrap();

        let same_time = Utc::now();
        {
            let mut registry = store.lock();
            for clip in registry.clips.values_mut() {
                clip.created_at = same_time;
            }
        }
        let order: Vec<PathBuf> = store.list().into_iter().map(|c| c.path).collect();
        assert_eq!(order, vec![a.clone(), b.clone()]);

        store.lock().clips.get_mut(&b).unwrap().created_at = same_time + chrono::Duration::seconds(5);
        let order: Vec<PathBuf> = store.list().into_iter().map(|c| c.path).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[tokio::test]
    async fn set_thumbnail_on_missing_clip_is_dropped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        assert!(!store.set_thumbnail(&dir.path().join("x.mp4"), Path::new("/t.png")).await);

        let path = write(&dir, "a.mp4", b"1");
        store.register(&path, None).await.unwrap();
        assert!(store.set_thumbnail(&path, Path::new("/t.png")).await);
        assert_eq!(store.get(&path).unwrap().thumbnail, Some(PathBuf::from("/t.png")));
    }

    #[tokio::test]
    async fn index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.mp4", b"1234");
        {
            let store = store_in(&dir).await;
            store.register(&path, None).await.unwrap();
            store.rename(&path, "keeper").await.unwrap();
        }

        let reopened = store_in(&dir).await;
        let clips = reopened.list();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].display_name, "keeper");
        assert_eq!(clips[0].path, dir.path().join("keeper.mp4"));
    }

    #[tokio::test]
    async fn corrupt_index_is_tolerated_by_open_only() {
        let dir = TempDir::new().unwrap();
        write(&dir, INDEX_FILE_NAME, b"{not json");

        let strict = ClipStore::open_strict(dir.path(), Arc::new(FixedProbe(1.0))).await;
        assert!(matches!(strict, Err(ClipStoreError::IndexCorrupt { .. })));

        let lenient = store_in(&dir).await;
        assert!(lenient.is_empty());
    }

    #[tokio::test]
    async fn delete_of_already_missing_file_succeeds() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let path = write(&dir, "a.mp4", b"1");
        store.register(&path, None).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        store.delete(&path).await.unwrap();
        assert!(store.get(&path).is_none());
    }

    #[tokio::test]
    async fn delete_removes_thumbnail() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let path = write(&dir, "a.mp4", b"1");
        let thumb = write(&dir, "a.png", b"png");
        store.register(&path, None).await.unwrap();
        store.set_thumbnail(&path, &thumb).await;

        store.delete(&path).await.unwrap();
        assert!(!path.exists());
        assert!(!thumb.exists());
    }

    #[tokio::test]
    async fn rename_rejects_invalid_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let path = write(&dir, "a.mp4", b"1");
        store.register(&path, None).await.unwrap();

        let err = store.rename(&path, "../escape").await.unwrap_err();
        assert!(matches!(err, RenameError::InvalidName(_)));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn rename_to_own_name_collides() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let path = write(&dir, "a.mp4", b"1");
        let clip = store.register(&path, None).await.unwrap();

        let err = store.rename(&path, "a").await.unwrap_err();
        assert!(matches!(err, RenameError::NameCollision(_)));
        assert_eq!(store.get(&path), Some(clip));
    }

    #[tokio::test]
    async fn delete_racing_rename_stays_consistent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        for i in 0..20 {
            let path = write(&dir, &format!("race_{i}.mp4"), b"1");
            store.register(&path, None).await.unwrap();
            let new_name = format!("moved_{i}");
            let target = dir.path().join(format!("moved_{i}.mp4"));

            let (renamed, deleted) =
                tokio::join!(store.rename(&path, &new_name), store.delete(&path));

            match deleted {
                Ok(()) => {
                    assert!(renamed.is_err());
                    assert!(!path.exists() && !target.exists());
                    assert!(store.get(&target).is_none());
                }
                Err(DeleteError::NotFound(_)) => {
                    assert_eq!(renamed.unwrap().path, target);
                    assert!(target.exists());
                    assert!(store.get(&target).is_some());
                }
                Err(e) => panic!("unexpected delete error: {e}"),
            }
            assert!(store.get(&path).is_none());
        }
    }

    #[tokio::test]
    async fn save_as_into_directory_and_same_file() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let path = write(&dir, "a.mp4", b"payload");
        store.register(&path, None).await.unwrap();

        let copied = store.save_as(&path, out.path(), false).await.unwrap();
        assert_eq!(copied, out.path().join("a.mp4"));
        assert_eq!(std::fs::read(&copied).unwrap(), b"payload");
        assert!(!out.path().join("a.mp4.part").exists());

        let err = store.save_as(&path, &path, true).await.unwrap_err();
        assert!(matches!(err, CopyError::SameFile));
    }
}
