//! Capture backend domain module

mod area;
mod backend;
mod display;

pub use area::{CaptureArea, ParseCaptureAreaError};
pub use backend::{
    fallback_backend, select_backend, BackendSelectionError, CaptureBackendKind, CaptureBackendPreference,
    ParseBackendPreferenceError,
};
pub use display::DisplayServer;
