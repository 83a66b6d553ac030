//! Screen region value object

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Rectangle to record instead of the whole screen, in pixels.
///
/// Written `WxH+X+Y`, the geometry syntax wf-recorder's `-g` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureArea {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid capture region '{input}': {reason} (expected WxH+X+Y, e.g. 1280x720+0+0)")]
pub struct ParseCaptureAreaError {
    pub input: String,
    pub reason: &'static str,
}

impl CaptureArea {
    /// `WxH` for ffmpeg's `-video_size`
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for CaptureArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl FromStr for CaptureArea {
    type Err = ParseCaptureAreaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseCaptureAreaError {
            input: s.to_string(),
            reason,
        };
        let number = |part: &str| part.trim().parse::<u32>().map_err(|_| err("not a number"));

        let mut parts = s.trim().split('+');
        let size = parts.next().unwrap_or_default();
        let (width, height) = size.split_once('x').ok_or_else(|| err("missing WxH"))?;
        let (width, height) = (number(width)?, number(height)?);
        if width == 0 || height == 0 {
            return Err(err("width and height must be positive"));
        }

        let (x, y) = match (parts.next(), parts.next(), parts.next()) {
            (None, None, None) => (0, 0),
            (Some(x), Some(y), None) => (number(x)?, number(y)?),
            _ => return Err(err("offset must be +X+Y")),
        };

        Ok(Self {
            width,
            height,
            x,
            y,
        })
    }
}
