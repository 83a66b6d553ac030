//! Shared wiring for the CLI commands

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::ConfigStore;
use crate::application::{ClipStore, ReconcileReport, ThumbnailService};
use crate::domain::clip::Clip;
use crate::domain::config::AppConfig;
use crate::domain::error::ErrorCategory;
use crate::infrastructure::{FfmpegThumbnailer, FfprobeProbe, XdgConfigStore};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the recordings directory
pub const RECORDINGS_DIR_ENV: &str = "NOVA_RECORDINGS_DIR";

/// Subdirectory of the platform video dir used by default
const DEFAULT_RECORDINGS_SUBDIR: &str = "Nova";

/// A failed command, carrying the exit code it maps to
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad arguments or configuration values
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    /// Usage errors for configuration problems, plain errors otherwise
    pub fn from_category(category: ErrorCategory, message: impl Into<String>) -> Self {
        match category {
            ErrorCategory::Configuration => Self::Usage(message.into()),
            _ => Self::Failed(message.into()),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE_ERROR,
            Self::Failed(_) => EXIT_ERROR,
        }
    }
}

/// Print a command result and turn it into the process exit code
pub fn finish(result: Result<(), CommandError>, presenter: &super::Presenter) -> ExitCode {
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.read().await.unwrap_or_else(|e| {
        tracing::warn!("Ignoring config file: {}", e);
        AppConfig::empty()
    });

    let env_config = AppConfig {
        recordings_dir: env::var(RECORDINGS_DIR_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Configured recordings directory, else `<Videos>/Nova`
pub fn resolve_recordings_dir(config: &AppConfig) -> PathBuf {
    if let Some(dir) = config.recordings_dir_path() {
        return dir;
    }
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_RECORDINGS_SUBDIR)
}

/// Clip store plus optional thumbnail service for one recordings directory
pub struct ClipLibrary {
    pub store: Arc<ClipStore>,
    pub thumbnails: Option<ThumbnailService>,
}

impl ClipLibrary {
    /// Open the store for the configured directory
    pub async fn open(config: &AppConfig) -> Result<Self, CommandError> {
        let dir = resolve_recordings_dir(config);
        let store = ClipStore::open(&dir, Arc::new(FfprobeProbe::new()))
            .await
            .map_err(|e| CommandError::Failed(e.to_string()))?;
        let store = Arc::new(store);

        let thumbnails = config.thumbnails_or_default().then(|| {
            ThumbnailService::new(Arc::new(FfmpegThumbnailer::new()), Arc::clone(&store))
        });

        Ok(Self { store, thumbnails })
    }

    /// Directory the store persists into
    pub fn directory(&self) -> &Path {
        self.store.directory()
    }

    /// Adopt new files and prune deleted ones
    pub async fn sync(&self) -> Result<ReconcileReport, CommandError> {
        self.store
            .reconcile(self.directory())
            .await
            .map_err(|e| CommandError::Failed(e.to_string()))
    }

    /// Generate a thumbnail now, reporting failures as warnings
    pub async fn thumbnail(&self, clip: &Clip, presenter: &super::Presenter) {
        if let Some(thumbnails) = &self.thumbnails {
            if let Err(e) = thumbnails.generate(clip).await {
                presenter.warn(&format!("No thumbnail for {}: {}", clip.file_name(), e));
            }
        }
    }

    /// Find a clip by file name (inside the recordings directory) or path
    pub fn resolve_clip(&self, reference: &str) -> Result<Clip, CommandError> {
        let candidate = clip_reference_path(self.directory(), reference);
        if let Some(clip) = self.store.get(&candidate) {
            return Ok(clip);
        }
        if let Ok(canonical) = candidate.canonicalize() {
            if let Some(clip) = self
                .store
                .list()
                .into_iter()
                .find(|c| c.path.canonicalize().is_ok_and(|p| p == canonical))
            {
                return Ok(clip);
            }
        }
        Err(CommandError::Failed(format!(
            "Unknown clip '{}' (not in {})",
            reference,
            self.directory().display()
        )))
    }
}

/// Bare names resolve inside `directory`; anything with a separator is a path
fn clip_reference_path(directory: &Path, reference: &str) -> PathBuf {
    let as_path = Path::new(reference);
    if as_path.is_absolute() {
        return as_path.to_path_buf();
    }
    if as_path.components().count() == 1 {
        return directory.join(as_path);
    }
    env::current_dir()
        .map(|cwd| cwd.join(as_path))
        .unwrap_or_else(|_| as_path.to_path_buf())
}
