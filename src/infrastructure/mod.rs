//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external tools like wf-recorder, ffmpeg and ffprobe.

pub mod capture;
pub mod config;
pub mod media;
pub mod notification;

// Re-export adapters
pub use capture::{
    CaptureSettings, CommandBackend, EnvironmentBackendResolver, FfmpegPipewireBackend,
    FfmpegX11Backend, FixedBackendResolver, WfRecorderBackend,
};
pub use config::XdgConfigStore;
pub use media::{FfmpegStreamCopier, FfmpegThumbnailer, FfprobeProbe};
pub use notification::{create_notifier, NoOpNotifier, NotifyRustNotifier};
