//! ffmpeg PipeWire capture backend (Wayland without wlr-screencopy)

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::debug;

use crate::application::ports::{CaptureBackend, CaptureError};
use crate::domain::capture::CaptureBackendKind;

use super::process::{interrupt, spawn_capture};

const CAPABILITY_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Records the PipeWire screen-cast stream with ffmpeg.
///
/// Needs an ffmpeg build with PipeWire input and a running
/// xdg-desktop-portal; a region cannot be selected here.
pub struct FfmpegPipewireBackend {
    fps: u32,
}

impl FfmpegPipewireBackend {
    pub fn new(fps: u32) -> Self {
        Self { fps }
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "pipewire".to_string(),
            "-framerate".to_string(),
            self.fps.to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

impl CaptureBackend for FfmpegPipewireBackend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::FfmpegPipewire
    }

    fn start(&self, output: &Path) -> Result<Child, CaptureError> {
        spawn_capture("ffmpeg", &self.build_args(output))
    }

    fn request_stop(&self, child: &Child) -> Result<(), CaptureError> {
        interrupt(child)
    }
}

/// Whether the installed ffmpeg knows the `pipewire` protocol
pub async fn ffmpeg_supports_pipewire() -> bool {
    let query = Command::new("ffmpeg")
        .args(["-hide_banner", "-protocols"])
        .stdin(Stdio::null())
        .output();

    match timeout(CAPABILITY_QUERY_TIMEOUT, query).await {
        Ok(Ok(output)) => lists_pipewire(&output.stdout) || lists_pipewire(&output.stderr),
        Ok(Err(e)) => {
            debug!("ffmpeg -protocols failed: {}", e);
            false
        }
        Err(_) => {
            debug!("ffmpeg -protocols timed out");
            false
        }
    }
}

fn lists_pipewire(listing: &[u8]) -> bool {
    String::from_utf8_lossy(listing)
        .lines()
        .any(|line| line.trim() == "pipewire")
}
