//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod notifier;
pub mod probe;
pub mod stream_copy;
pub mod thumbnail;

// Re-export common types
pub use capture::{BackendResolver, CaptureBackend, CaptureError};
pub use config::ConfigStore;
pub use notifier::{NotificationError, Notifier, RecordingNotice};
pub use probe::{MediaProbe, ProbeError};
pub use stream_copy::{StreamCopier, StreamCopyError};
pub use thumbnail::{ThumbnailError, ThumbnailGenerator};
