//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod clip_store;
pub mod ports;
pub mod session;
pub mod thumbnails;
pub mod trim;

// Re-export use cases
pub use clip_store::{
    ClipStore, ClipStoreError, CopyError, DeleteError, ReconcileReport, RenameError,
};
pub use session::{
    CaptureExit, RecordingSession, SessionConfig, SessionEvent, SessionHandle, SessionStatus,
    StartError, StopError,
};
pub use thumbnails::ThumbnailService;
pub use trim::{TrimEngine, TrimError};
