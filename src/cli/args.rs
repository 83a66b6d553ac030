//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::capture::CaptureBackendPreference;
use crate::domain::recording::Duration;

/// Nova Replay - local screen clip recorder
#[derive(Parser, Debug)]
#[command(name = "nova-replay")]
#[command(version)]
#[command(about = "Record screen clips, then trim, rename and manage them")]
#[command(long_about = None)]
pub struct Cli {
    /// Recordings directory (overrides config and NOVA_RECORDINGS_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record the screen until stopped
    Record(RecordArgs),
    /// Ask the running recorder to stop and save its clip
    Stop,
    /// Show whether a recorder is running
    Status,
    /// Manage recorded clips
    Clips {
        #[command(subcommand)]
        action: ClipsAction,
    },
    /// Cut a time range out of a clip into a new clip
    Trim {
        /// Clip file name or path
        clip: String,
        /// Start offset in seconds
        #[arg(long, value_name = "SECS")]
        start: f64,
        /// End offset in seconds
        #[arg(long, value_name = "SECS")]
        end: f64,
    },
    /// Split a clip into two new clips at a point in time
    Split {
        /// Clip file name or path
        clip: String,
        /// Split point in seconds
        #[arg(long, value_name = "SECS")]
        at: f64,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `record`
#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    /// Capture backend (auto, wf-recorder, ffmpeg-x11, pipewire, custom)
    #[arg(short = 'b', long, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Output file name template (strftime syntax)
    #[arg(short = 't', long, value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Record only this screen region (WxH+X+Y)
    #[arg(short = 'r', long, value_name = "GEOMETRY")]
    pub region: Option<String>,

    /// Stop automatically after this long (e.g., 30s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Skip thumbnail generation
    #[arg(long)]
    pub no_thumbnail: bool,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,
}

/// Clip management actions
#[derive(Subcommand, Debug)]
pub enum ClipsAction {
    /// List known clips, newest first
    List,
    /// Sync the clip index with the recordings directory
    Reconcile,
    /// Delete a clip and its thumbnail
    Delete {
        /// Clip file name or path
        clip: String,
    },
    /// Rename a clip (the extension is kept unless given)
    Rename {
        /// Clip file name or path
        clip: String,
        /// New name
        name: String,
    },
    /// Copy a clip elsewhere
    SaveAs {
        /// Clip file name or path
        clip: String,
        /// Destination file or directory
        destination: PathBuf,
        /// Replace an existing destination file
        #[arg(short = 'f', long)]
        force: bool,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub recordings_dir: PathBuf,
    pub filename_template: String,
    pub max_duration: Option<Duration>,
    pub stop_timeout: Duration,
    pub notify: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "recordings_dir",
    "filename_template",
    "backend",
    "fps",
    "region",
    "stop_timeout",
    "thumbnails",
    "notify",
    "custom_command",
    "linux.wayland_output",
    "linux.x11_display",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

/// Parse a `--backend` value
pub fn parse_backend(value: &str) -> Result<CaptureBackendPreference, String> {
    value
        .parse::<CaptureBackendPreference>()
        .map_err(|e| e.to_string())
}
