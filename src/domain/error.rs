//! Domain error types

use std::fmt;

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 5s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a clip name cannot be used as a file name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid clip name \"{input}\": {reason}")]
pub struct InvalidClipName {
    pub input: String,
    pub reason: &'static str,
}

/// Error when trim offsets fall outside the clip
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid trim range {start}s..{end}s for a {duration}s clip (need 0 <= start < end <= duration)")]
pub struct InvalidTrimRange {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Coarse classification shared by every operation error.
///
/// Callers use it to decide how to surface a failure; nothing in the core
/// retries on any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad directory, missing binaries, invalid settings
    Configuration,
    /// Capture crash, non-zero exit, empty output
    Process,
    /// Permission, missing file, name collision
    FileSystem,
    /// Trim or probe tool failure
    ExternalTool,
}

impl ErrorCategory {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Process => "process",
            Self::FileSystem => "filesystem",
            Self::ExternalTool => "external-tool",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
