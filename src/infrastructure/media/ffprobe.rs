//! ffprobe duration adapter

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{MediaProbe, ProbeError};

use super::last_line;

/// Reads container duration with ffprobe
#[derive(Debug, Default)]
pub struct FfprobeProbe;

impl FfprobeProbe {
    pub fn new() -> Self {
        Self
    }

    fn parse_duration(stdout: &str) -> Option<f64> {
        let value: f64 = stdout.trim().parse().ok()?;
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ProbeError::ToolNotFound("ffprobe".to_string())
                } else {
                    ProbeError::Unreadable(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::Unreadable(format!(
                "{}: {}",
                path.display(),
                last_line(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_duration(&stdout).ok_or_else(|| {
            ProbeError::Unreadable(format!("{}: no duration ({})", path.display(), stdout.trim()))
        })
    }
}
