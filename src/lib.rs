//! Nova Replay - local screen clip recorder
//!
//! This crate supervises an external screen-capture process, turns its output
//! into managed clips, and keeps a clip library in sync with the recordings
//! directory. Trims are stream copies that never touch the source clip.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the session state machine, and errors
//! - **Application**: Recording session, clip store, trim engine, thumbnail
//!   jobs, and the port interfaces (traits) they depend on
//! - **Infrastructure**: Adapter implementations (wf-recorder, ffmpeg, ffprobe,
//!   notify-rust, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

#[cfg(not(unix))]
compile_error!("nova-replay supports Unix desktops only (Wayland or X11)");

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
