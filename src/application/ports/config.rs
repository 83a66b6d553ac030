//! Settings persistence port

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Where recorder settings live between runs
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Settings file location, whether or not it exists yet
    fn location(&self) -> &Path;

    /// Read stored settings. A missing file reads as all keys unset.
    async fn read(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the stored settings with `config`
    async fn write(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Store the built-in defaults; never overwrites an existing file
    async fn write_defaults(&self) -> Result<PathBuf, ConfigError> {
        let location = self.location().to_path_buf();
        if tokio::fs::try_exists(&location).await.unwrap_or(false) {
            return Err(ConfigError::AlreadyExists(location.display().to_string()));
        }
        self.write(&AppConfig::defaults()).await?;
        Ok(location)
    }
}
