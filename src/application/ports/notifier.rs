//! Desktop notification port

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Recorder milestones worth a desktop notification
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingNotice {
    Started { backend: String },
    Saved { file_name: String, duration: String },
    Failed { reason: String },
    Crashed { salvaged: Option<String> },
}

impl RecordingNotice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Recording",
            Self::Saved { .. } => "Clip saved",
            Self::Failed { .. } => "Recording failed",
            Self::Crashed { .. } => "Capture crashed",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Started { backend } => format!("Screen recording started ({})", backend),
            Self::Saved {
                file_name,
                duration,
            } => format!("{} ({})", file_name, duration),
            Self::Failed { reason } => reason.clone(),
            Self::Crashed {
                salvaged: Some(file_name),
            } => format!("Partial recording saved as {}", file_name),
            Self::Crashed { salvaged: None } => "Nothing was recorded".to_string(),
        }
    }

    /// Freedesktop icon name
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "media-record",
            Self::Saved { .. } => "dialog-ok",
            Self::Failed { .. } | Self::Crashed { .. } => "dialog-error",
        }
    }

    /// Failures stay on screen until dismissed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Crashed { .. })
    }
}

/// Port for desktop notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &RecordingNotice) -> Result<(), NotificationError>;
}

#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn notify(&self, notice: &RecordingNotice) -> Result<(), NotificationError> {
        self.as_ref().notify(notice).await
    }
}
