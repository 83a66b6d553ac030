//! Capture backend infrastructure module
//!
//! Backends for wf-recorder (Wayland), ffmpeg (x11grab or PipeWire) and a
//! user-supplied command, plus the resolver that picks one per recording.

mod command;
mod ffmpeg_pipewire;
mod ffmpeg_x11;
mod process;
mod resolver;
mod wf_recorder;

pub use command::{CommandBackend, OUTPUT_PLACEHOLDER};
pub use ffmpeg_pipewire::{ffmpeg_supports_pipewire, FfmpegPipewireBackend};
pub use ffmpeg_x11::FfmpegX11Backend;
pub use process::is_tool_available;
pub use resolver::{CaptureSettings, EnvironmentBackendResolver, FixedBackendResolver};
pub use wf_recorder::WfRecorderBackend;
