//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the recorder PID lock and the command handlers.

pub mod app;
pub mod args;
pub mod clips_cmd;
pub mod config_cmd;
pub mod pid_file;
pub mod presenter;
pub mod record_app;
pub mod recorder_cmd;
pub mod signals;
pub mod trim_cmd;

// Re-export commonly used types
pub use app::{ClipLibrary, CommandError, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, ClipsAction, Commands, ConfigAction, RecordArgs, RecordOptions};
pub use presenter::Presenter;
pub use record_app::run_record;
