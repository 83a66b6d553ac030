//! ffmpeg x11grab capture backend

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::application::ports::{CaptureBackend, CaptureError};
use crate::domain::capture::{CaptureArea, CaptureBackendKind};

use super::process::{interrupt, spawn_capture};

/// Screen size used when xdpyinfo is missing or unparseable
pub const FALLBACK_SCREEN_SIZE: (u32, u32) = (1920, 1080);

/// Records an X display with ffmpeg's x11grab device
pub struct FfmpegX11Backend {
    display: String,
    screen_size: (u32, u32),
    fps: u32,
    area: Option<CaptureArea>,
}

impl FfmpegX11Backend {
    pub fn new(display: impl Into<String>, screen_size: (u32, u32), fps: u32) -> Self {
        Self {
            display: display.into(),
            screen_size,
            fps,
            area: None,
        }
    }

    /// Grab only `area` instead of the whole screen
    pub fn with_area(mut self, area: Option<CaptureArea>) -> Self {
        self.area = area;
        self
    }

    /// Build a backend for `display`, querying its size with xdpyinfo
    pub async fn detect(display: impl Into<String>, fps: u32) -> Self {
        let display = display.into();
        let screen_size = query_screen_size(&display)
            .await
            .unwrap_or(FALLBACK_SCREEN_SIZE);
        Self::new(display, screen_size, fps)
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        let (size, offset) = match self.area {
            Some(area) => (area.size(), format!("+{},{}", area.x, area.y)),
            None => {
                let (width, height) = self.screen_size;
                (format!("{}x{}", width, height), "+0,0".to_string())
            }
        };
        vec![
            "-y".to_string(),
            "-video_size".to_string(),
            size,
            "-framerate".to_string(),
            self.fps.to_string(),
            "-f".to_string(),
            "x11grab".to_string(),
            "-i".to_string(),
            format!("{}{}", self.display, offset),
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

impl CaptureBackend for FfmpegX11Backend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::FfmpegX11
    }

    fn start(&self, output: &Path) -> Result<Child, CaptureError> {
        spawn_capture("ffmpeg", &self.build_args(output))
    }

    fn request_stop(&self, child: &Child) -> Result<(), CaptureError> {
        // ffmpeg writes the moov atom on SIGINT
        interrupt(child)
    }
}

async fn query_screen_size(x_display: &str) -> Option<(u32, u32)> {
    let output = Command::new("xdpyinfo")
        .arg("-display")
        .arg(x_display)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        debug!(x_display, "xdpyinfo failed");
        return None;
    }
    parse_dimensions(&String::from_utf8_lossy(&output.stdout))
}

/// Extract `WxH` from xdpyinfo's `dimensions:` line
fn parse_dimensions(xdpyinfo: &str) -> Option<(u32, u32)> {
    let line = xdpyinfo
        .lines()
        .find(|l| l.trim_start().starts_with("dimensions:"))?;
    let size = line.split_whitespace().nth(1)?;
    let (width, height) = size.split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_xdpyinfo_dimensions() {
        let sample = "screen #0:\n  dimensions:    2560x1440 pixels (677x381 millimeters)\n  resolution:    96x96 dots per inch\n";
        assert_eq!(parse_dimensions(sample), Some((2560, 1440)));
    }

    #[test]
    fn missing_dimensions_is_none() {
        assert_eq!(parse_dimensions("name of display:    :0\n"), None);
        assert_eq!(parse_dimensions("  dimensions:    garbage\n"), None);
    }

    #[test]
    fn builds_x11grab_command() {
        let backend = FfmpegX11Backend::new(":1", (1280, 720), 24);
        let args = backend.build_args(Path::new("/rec/a.mp4"));
        assert_eq!(args[2], "1280x720");
        assert_eq!(args[4], "24");
        assert!(args.contains(&"x11grab".to_string()));
        assert!(args.contains(&":1+0,0".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/rec/a.mp4"));
        assert_eq!(backend.name(), "ffmpeg-x11");
    }

    #[test]
    fn region_sets_size_and_offset() {
        let area = "640x480+100+50".parse().ok();
        let backend = FfmpegX11Backend::new(":0", (1920, 1080), 30).with_area(area);
        let args = backend.build_args(Path::new("/rec/a.mp4"));
        assert_eq!(args[2], "640x480");
        assert!(args.contains(&":0+100,50".to_string()));
    }
}
