//! `stop` and `status` handlers, talking to the recorder through its PID file

use std::time::Duration as StdDuration;

use tokio::time::{sleep, Instant};

use super::app::CommandError;
use super::pid_file::{PidFile, PidFileError};
use super::presenter::Presenter;

const POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Extra time on top of the grace period for saving the clip
const SAVE_SLACK: StdDuration = StdDuration::from_secs(5);

/// Ask the running recorder to stop and wait for it to exit
pub async fn handle_stop_command(
    pid_file: &PidFile,
    grace_period: StdDuration,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    let pid = pid_file.signal_stop().map_err(|e| match e {
        PidFileError::NotRunning => {
            CommandError::Failed("No recorder running. Start one with: nova-replay record".into())
        }
        other => CommandError::Failed(other.to_string()),
    })?;
    presenter.info(&format!("Stop requested (PID: {})", pid));

    let deadline = Instant::now() + grace_period + SAVE_SLACK;
    while pid_file.is_running() == Some(pid) {
        if Instant::now() >= deadline {
            return Err(CommandError::Failed(format!(
                "Recorder (PID: {}) is still running",
                pid
            )));
        }
        sleep(POLL_INTERVAL).await;
    }

    presenter.success("Recorder stopped");
    Ok(())
}

/// Report whether a recorder is running; prints `recording` or `idle` to stdout
pub fn handle_status_command(pid_file: &PidFile, presenter: &Presenter) {
    match pid_file.is_running() {
        Some(pid) => {
            presenter.recorder_status(&format!("recording (PID: {})", pid));
            presenter.output("recording");
        }
        None => {
            presenter.recorder_status("idle");
            presenter.output("idle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn stop_without_recorder_fails() {
        let dir = TempDir::new().unwrap();
        let pid_file = PidFile::with_path(dir.path().join("rec.pid"));
        let err = handle_stop_command(&pid_file, StdDuration::from_secs(1), &Presenter::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No recorder running"));
    }

    #[test]
    fn status_cleans_stale_pid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rec.pid");
        fs::write(&path, "999999999").unwrap();

        handle_status_command(&PidFile::with_path(&path), &Presenter::new());
        assert!(!path.exists());
    }
}
