//! Capture backend kinds, user preference and resolution

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::display::DisplayServer;

/// Concrete capture tool, resolved once per recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBackendKind {
    /// Wayland: wf-recorder
    WfRecorder,
    /// X11 (or XWayland): ffmpeg x11grab
    FfmpegX11,
    /// Wayland through PipeWire: ffmpeg's pipewire input
    FfmpegPipewire,
    /// User-configured command line
    Custom,
}

impl CaptureBackendKind {
    /// Executable the backend launches, when fixed
    pub const fn binary(&self) -> Option<&'static str> {
        match self {
            Self::WfRecorder => Some("wf-recorder"),
            Self::FfmpegX11 | Self::FfmpegPipewire => Some("ffmpeg"),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for CaptureBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureBackendKind::WfRecorder => write!(f, "wf-recorder"),
            CaptureBackendKind::FfmpegX11 => write!(f, "ffmpeg-x11"),
            CaptureBackendKind::FfmpegPipewire => write!(f, "ffmpeg-pipewire"),
            CaptureBackendKind::Custom => write!(f, "custom"),
        }
    }
}

/// User preference for capture backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureBackendPreference {
    /// wf-recorder under Wayland when installed, otherwise ffmpeg
    #[default]
    Auto,
    WfRecorder,
    FfmpegX11,
    /// ffmpeg built with PipeWire input support
    Pipewire,
    /// Run `custom_command` from the configuration
    Custom,
}

impl fmt::Display for CaptureBackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureBackendPreference::Auto => write!(f, "auto"),
            CaptureBackendPreference::WfRecorder => write!(f, "wf-recorder"),
            CaptureBackendPreference::FfmpegX11 => write!(f, "ffmpeg-x11"),
            CaptureBackendPreference::Pipewire => write!(f, "pipewire"),
            CaptureBackendPreference::Custom => write!(f, "custom"),
        }
    }
}

/// Error type for parsing a backend preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBackendPreferenceError {
    pub value: String,
    pub valid_options: &'static str,
}

impl fmt::Display for ParseBackendPreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid capture backend '{}'. Valid options: {}",
            self.value, self.valid_options
        )
    }
}

impl std::error::Error for ParseBackendPreferenceError {}

impl FromStr for CaptureBackendPreference {
    type Err = ParseBackendPreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(CaptureBackendPreference::Auto),
            "wf-recorder" => Ok(CaptureBackendPreference::WfRecorder),
            "ffmpeg-x11" | "ffmpeg" => Ok(CaptureBackendPreference::FfmpegX11),
            "pipewire" | "ffmpeg-pipewire" => Ok(CaptureBackendPreference::Pipewire),
            "custom" => Ok(CaptureBackendPreference::Custom),
            _ => Err(ParseBackendPreferenceError {
                value: s.to_string(),
                valid_options: "auto, wf-recorder, ffmpeg-x11, pipewire, custom",
            }),
        }
    }
}

/// Why no backend could be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendSelectionError {
    #[error("No capture backend available for this {0} session (install wf-recorder or ffmpeg)")]
    NoBackendAvailable(DisplayServer),

    #[error("Capture tool not found: {0}")]
    ToolNotFound(String),

    #[error("Backend 'custom' selected but no custom_command is configured")]
    CustomCommandMissing,
}

/// Resolve the backend to use for one recording.
///
/// `custom_program` is the executable of the configured custom command, if
/// any. `is_available` reports whether a binary can be found on `PATH`.
pub fn select_backend(
    preference: CaptureBackendPreference,
    display: DisplayServer,
    custom_program: Option<&str>,
    is_available: impl Fn(&str) -> bool,
) -> Result<CaptureBackendKind, BackendSelectionError> {
    let require = |kind: CaptureBackendKind, binary: &str| {
        if is_available(binary) {
            Ok(kind)
        } else {
            Err(BackendSelectionError::ToolNotFound(binary.to_string()))
        }
    };

    match preference {
        CaptureBackendPreference::WfRecorder => {
            require(CaptureBackendKind::WfRecorder, "wf-recorder")
        }
        CaptureBackendPreference::FfmpegX11 => require(CaptureBackendKind::FfmpegX11, "ffmpeg"),
        CaptureBackendPreference::Pipewire => {
            require(CaptureBackendKind::FfmpegPipewire, "ffmpeg")
        }
        CaptureBackendPreference::Custom => match custom_program {
            Some(program) => require(CaptureBackendKind::Custom, program),
            None => Err(BackendSelectionError::CustomCommandMissing),
        },
        CaptureBackendPreference::Auto => match display {
            DisplayServer::Wayland if is_available("wf-recorder") => {
                Ok(CaptureBackendKind::WfRecorder)
            }
            DisplayServer::Wayland | DisplayServer::X11 if is_available("ffmpeg") => {
                Ok(CaptureBackendKind::FfmpegX11)
            }
            _ => Err(BackendSelectionError::NoBackendAvailable(display)),
        },
    }
}

/// Backend to retry with after `failed` died during startup.
///
/// Only wf-recorder has one: compositors without wlr-screencopy reject it
/// immediately. X11 sessions fall back to x11grab, Wayland sessions to
/// ffmpeg's PipeWire input when the local ffmpeg build supports it.
pub fn fallback_backend(
    failed: CaptureBackendKind,
    display: DisplayServer,
    ffmpeg_available: bool,
    ffmpeg_has_pipewire: bool,
) -> Option<CaptureBackendKind> {
    if failed != CaptureBackendKind::WfRecorder || !ffmpeg_available {
        return None;
    }
    match display {
        DisplayServer::X11 => Some(CaptureBackendKind::FfmpegX11),
        DisplayServer::Wayland if ffmpeg_has_pipewire => Some(CaptureBackendKind::FfmpegPipewire),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(tools: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |t| tools.contains(&t)
    }

    #[test]
    fn preference_round_trips_through_strings() {
        for value in ["auto", "wf-recorder", "ffmpeg-x11", "pipewire", "custom"] {
            let pref: CaptureBackendPreference = value.parse().unwrap();
            assert_eq!(pref.to_string(), value);
        }
        assert_eq!(
            "FFMPEG".parse::<CaptureBackendPreference>().unwrap(),
            CaptureBackendPreference::FfmpegX11
        );
    }

    #[test]
    fn preference_parse_error_lists_options() {
        let err = "obs".parse::<CaptureBackendPreference>().unwrap_err();
        assert_eq!(err.value, "obs");
        assert!(err.to_string().contains("wf-recorder"));
    }

    #[test]
    fn auto_prefers_wf_recorder_on_wayland() {
        let kind = select_backend(
            CaptureBackendPreference::Auto,
            DisplayServer::Wayland,
            None,
            only(&["wf-recorder", "ffmpeg"]),
        )
        .unwrap();
        assert_eq!(kind, CaptureBackendKind::WfRecorder);
    }

    #[test]
    fn auto_falls_back_to_ffmpeg() {
        let kind = select_backend(
            CaptureBackendPreference::Auto,
            DisplayServer::Wayland,
            None,
            only(&["ffmpeg"]),
        )
        .unwrap();
        assert_eq!(kind, CaptureBackendKind::FfmpegX11);
    }

    #[test]
    fn auto_ignores_wf_recorder_on_x11() {
        let kind = select_backend(
            CaptureBackendPreference::Auto,
            DisplayServer::X11,
            None,
            only(&["wf-recorder", "ffmpeg"]),
        )
        .unwrap();
        assert_eq!(kind, CaptureBackendKind::FfmpegX11);
    }

    #[test]
    fn auto_without_tools_is_unavailable() {
        let err = select_backend(
            CaptureBackendPreference::Auto,
            DisplayServer::X11,
            None,
            only(&[]),
        )
        .unwrap_err();
        assert_eq!(err, BackendSelectionError::NoBackendAvailable(DisplayServer::X11));
    }

    #[test]
    fn auto_headless_is_unavailable() {
        let err = select_backend(
            CaptureBackendPreference::Auto,
            DisplayServer::Headless,
            None,
            only(&["ffmpeg"]),
        )
        .unwrap_err();
        assert!(matches!(err, BackendSelectionError::NoBackendAvailable(_)));
    }

    #[test]
    fn explicit_missing_tool() {
        let err = select_backend(
            CaptureBackendPreference::WfRecorder,
            DisplayServer::Wayland,
            None,
            only(&["ffmpeg"]),
        )
        .unwrap_err();
        assert_eq!(err, BackendSelectionError::ToolNotFound("wf-recorder".into()));
    }

    #[test]
    fn custom_requires_command() {
        let err = select_backend(
            CaptureBackendPreference::Custom,
            DisplayServer::Headless,
            None,
            only(&["sh"]),
        )
        .unwrap_err();
        assert_eq!(err, BackendSelectionError::CustomCommandMissing);

        let kind = select_backend(
            CaptureBackendPreference::Custom,
            DisplayServer::Headless,
            Some("sh"),
            only(&["sh"]),
        )
        .unwrap();
        assert_eq!(kind, CaptureBackendKind::Custom);
    }

    #[test]
    fn wf_recorder_falls_back_by_display() {
        use CaptureBackendKind::*;

        assert_eq!(
            fallback_backend(WfRecorder, DisplayServer::X11, true, false),
            Some(FfmpegX11)
        );
        assert_eq!(
            fallback_backend(WfRecorder, DisplayServer::Wayland, true, true),
            Some(FfmpegPipewire)
        );
        assert_eq!(fallback_backend(WfRecorder, DisplayServer::Wayland, true, false), None);
        assert_eq!(fallback_backend(WfRecorder, DisplayServer::X11, false, true), None);
    }

    #[test]
    fn only_wf_recorder_has_a_fallback() {
        for kind in [
            CaptureBackendKind::FfmpegX11,
            CaptureBackendKind::FfmpegPipewire,
            CaptureBackendKind::Custom,
        ] {
            assert_eq!(fallback_backend(kind, DisplayServer::X11, true, true), None);
        }
    }

    #[test]
    fn explicit_pipewire_needs_ffmpeg() {
        let kind = select_backend(
            CaptureBackendPreference::Pipewire,
            DisplayServer::Wayland,
            None,
            only(&["ffmpeg"]),
        )
        .unwrap();
        assert_eq!(kind, CaptureBackendKind::FfmpegPipewire);
    }
}
