//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod clip;
pub mod config;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use capture::{CaptureBackendKind, CaptureBackendPreference, DisplayServer};
pub use clip::{Clip, ClipName, TrimRange};
pub use config::AppConfig;
pub use error::*;
pub use recording::Duration;
pub use session::{SessionMachine, SessionState};
