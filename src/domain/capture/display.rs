//! Display server detection

use std::env;
use std::fmt;

/// Graphical session type the recorder runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Wayland,
    X11,
    /// No graphical session detected
    Headless,
}

impl DisplayServer {
    /// Classify from the raw environment values.
    ///
    /// `XDG_SESSION_TYPE` wins when it names a known server, then
    /// `WAYLAND_DISPLAY`, then `DISPLAY`.
    pub fn from_env_values(
        session_type: Option<&str>,
        wayland_display: Option<&str>,
        display: Option<&str>,
    ) -> Self {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        match non_empty(session_type).map(str::to_ascii_lowercase).as_deref() {
            Some("wayland") => return Self::Wayland,
            Some("x11") => return Self::X11,
            _ => {}
        }
        if non_empty(wayland_display).is_some() {
            return Self::Wayland;
        }
        if non_empty(display).is_some() {
            return Self::X11;
        }
        Self::Headless
    }

    /// Detect from the current process environment
    pub fn detect() -> Self {
        let session_type = env::var("XDG_SESSION_TYPE").ok();
        let wayland_display = env::var("WAYLAND_DISPLAY").ok();
        let display = env::var("DISPLAY").ok();
        Self::from_env_values(
            session_type.as_deref(),
            wayland_display.as_deref(),
            display.as_deref(),
        )
    }

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wayland => "wayland",
            Self::X11 => "x11",
            Self::Headless => "headless",
        }
    }
}

impl fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
