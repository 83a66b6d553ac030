//! Desktop notification adapter using notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{NotificationError, Notifier, RecordingNotice};

/// How long recording notifications stay on screen
const DEFAULT_TIMEOUT_MS: u32 = 5000;

/// Desktop notifier using notify-rust
pub struct NotifyRustNotifier {
    app_name: String,
    timeout_ms: u32,
}

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self::with_app_name("Nova Replay")
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    fn timeout_for(&self, notice: &RecordingNotice) -> Timeout {
        if notice.is_failure() {
            Timeout::Never
        } else {
            Timeout::Milliseconds(self.timeout_ms)
        }
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(&self, notice: &RecordingNotice) -> Result<(), NotificationError> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(notice.title())
            .body(&notice.body())
            .icon(notice.icon_name())
            .timeout(self.timeout_for(notice));

        // Talking to the notification daemon blocks
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}
