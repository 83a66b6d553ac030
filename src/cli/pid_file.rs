//! PID file guarding the single recorder instance

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// PID file name inside the runtime directory
const PID_FILE_NAME: &str = "nova-replay.pid";

/// PID file for the `record` command
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    /// `$XDG_RUNTIME_DIR/nova-replay.pid`, or the temp dir when unset
    pub fn new() -> Self {
        let dir = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Self::with_path(dir.join(PID_FILE_NAME))
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    /// Get the PID file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID of the live recorder, if any. A stale file is removed.
    pub fn is_running(&self) -> Option<u32> {
        let pid = read_pid(&self.path)?;
        match kill(Pid::from_raw(pid as i32), None::<Signal>) {
            Ok(()) | Err(Errno::EPERM) => Some(pid),
            Err(Errno::ESRCH) => {
                debug!("Removing stale PID file {} ({})", self.path.display(), pid);
                let _ = fs::remove_file(&self.path);
                None
            }
            Err(_) => None,
        }
    }

    /// Acquire the PID file (fails if another recorder is running)
    pub fn acquire(&mut self) -> Result<(), PidFileError> {
        // Second attempt follows removal of a stale file
        for _ in 0..2 {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.path)
            {
                Ok(mut file) => {
                    write!(file, "{}", process::id()).map_err(|e| {
                        PidFileError::WriteFailed(format!("Failed to write PID: {}", e))
                    })?;
                    self.owned = true;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if let Some(pid) = self.is_running() {
                        return Err(PidFileError::AlreadyRunning(pid));
                    }
                    // Unreadable leftovers are treated as stale
                    let _ = fs::remove_file(&self.path);
                }
                Err(e) => {
                    return Err(PidFileError::WriteFailed(format!(
                        "Failed to create PID file {}: {}",
                        self.path.display(),
                        e
                    )))
                }
            }
        }

        Err(PidFileError::WriteFailed(format!(
            "PID file {} keeps reappearing",
            self.path.display()
        )))
    }

    /// Release the PID file if this process owns it
    pub fn release(&mut self) -> Result<(), PidFileError> {
        if !self.owned {
            return Ok(());
        }
        self.owned = false;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PidFileError::RemoveFailed(format!(
                "Failed to remove PID file: {}",
                e
            ))),
        }
    }

    /// Send SIGINT to the running recorder
    pub fn signal_stop(&self) -> Result<u32, PidFileError> {
        let pid = self.is_running().ok_or(PidFileError::NotRunning)?;
        kill(Pid::from_raw(pid as i32), Signal::SIGINT)
            .map_err(|e| PidFileError::SignalFailed(pid, e.to_string()))?;
        Ok(pid)
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    let contents = fs::read_to_string(path).ok()?;
    contents.trim().parse().ok()
}

/// PID file errors
#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another recorder is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("No recorder is running")]
    NotRunning,

    #[error("Failed to signal recorder (PID: {0}): {1}")]
    SignalFailed(u32, String),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(String),
}
