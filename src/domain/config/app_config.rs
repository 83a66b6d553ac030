//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::capture::{CaptureArea, CaptureBackendPreference};
use crate::domain::recording::{Duration, DEFAULT_FILENAME_TEMPLATE};

/// Default capture frame rate
pub const DEFAULT_FPS: u32 = 30;

/// Linux-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinuxConfig {
    /// Output name passed to wf-recorder (`-o`), e.g. "DP-1"
    pub wayland_output: Option<String>,
    /// X display grabbed by ffmpeg, overriding `$DISPLAY`
    pub x11_display: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub recordings_dir: Option<String>,
    pub filename_template: Option<String>,
    pub backend: Option<String>,
    pub fps: Option<u32>,
    /// Screen region `WxH+X+Y`; the whole screen when unset
    pub region: Option<String>,
    pub stop_timeout: Option<String>,
    pub thumbnails: Option<bool>,
    pub notify: Option<bool>,
    pub custom_command: Option<String>,
    pub linux: Option<LinuxConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            recordings_dir: None, // resolved from the platform video dir
            filename_template: Some(DEFAULT_FILENAME_TEMPLATE.to_string()),
            backend: Some("auto".to_string()),
            fps: Some(DEFAULT_FPS),
            region: None,
            stop_timeout: Some("5s".to_string()),
            thumbnails: Some(true),
            notify: Some(false),
            custom_command: None,
            linux: Some(LinuxConfig::default()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            filename_template: other.filename_template.or(self.filename_template),
            backend: other.backend.or(self.backend),
            fps: other.fps.or(self.fps),
            region: other.region.or(self.region),
            stop_timeout: other.stop_timeout.or(self.stop_timeout),
            thumbnails: other.thumbnails.or(self.thumbnails),
            notify: other.notify.or(self.notify),
            custom_command: other.custom_command.or(self.custom_command),
            linux: Self::merge_linux_config(self.linux, other.linux),
        }
    }

    /// Merge Linux config sections
    fn merge_linux_config(
        base: Option<LinuxConfig>,
        other: Option<LinuxConfig>,
    ) -> Option<LinuxConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(LinuxConfig {
                wayland_output: o.wayland_output.or(b.wayland_output),
                x11_display: o.x11_display.or(b.x11_display),
            }),
        }
    }

    /// Configured recordings directory, if any (`~` is expanded)
    pub fn recordings_dir_path(&self) -> Option<PathBuf> {
        let raw = self.recordings_dir.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }

    /// Get file name template, or the timestamp default
    pub fn filename_template_or_default(&self) -> &str {
        self.filename_template
            .as_deref()
            .unwrap_or(DEFAULT_FILENAME_TEMPLATE)
    }

    /// Get backend as parsed preference, or auto if not set/invalid
    pub fn backend_or_default(&self) -> CaptureBackendPreference {
        self.backend
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get frame rate, or 30 if not set/zero
    pub fn fps_or_default(&self) -> u32 {
        self.fps.filter(|&fps| fps > 0).unwrap_or(DEFAULT_FPS)
    }

    /// Get capture region, or `None` for full screen when not set/invalid
    pub fn region_or_default(&self) -> Option<CaptureArea> {
        self.region.as_deref().and_then(|s| s.parse().ok())
    }

    /// Get stop grace period as parsed Duration, or default if not set/invalid
    pub fn stop_timeout_or_default(&self) -> Duration {
        self.stop_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_stop_timeout)
    }

    /// Get thumbnails setting, or true if not set
    pub fn thumbnails_or_default(&self) -> bool {
        self.thumbnails.unwrap_or(true)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Get wf-recorder output name, if configured
    pub fn wayland_output(&self) -> Option<&str> {
        self.linux.as_ref().and_then(|l| l.wayland_output.as_deref())
    }

    /// Get X display override, if configured
    pub fn x11_display(&self) -> Option<&str> {
        self.linux.as_ref().and_then(|l| l.x11_display.as_deref())
    }
}
