//! No-op notifier used when notifications are disabled

use async_trait::async_trait;

use crate::application::ports::{NotificationError, Notifier, RecordingNotice};

/// Notifier that discards every notification
#[derive(Debug, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _notice: &RecordingNotice) -> Result<(), NotificationError> {
        Ok(())
    }
}
