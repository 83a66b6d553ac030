//! Clip entity

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Container extensions recognised as recordings (compared case-insensitively)
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi"];

/// Whether a directory entry name looks like an adoptable recording.
///
/// Hidden files and partial copies (`*.part`) never qualify.
pub fn is_media_file(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

/// A recorded (or trimmed) video file known to the clip store.
///
/// Identity is the absolute file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub thumbnail: Option<PathBuf>,
    pub display_name: String,
}

impl Clip {
    /// Create a clip with a display name derived from the file name
    pub fn new(path: PathBuf, created_at: DateTime<Utc>, duration_secs: f64, size_bytes: u64) -> Self {
        let display_name = Self::name_from_path(&path);
        Self {
            path,
            created_at,
            duration_secs,
            size_bytes,
            thumbnail: None,
            display_name,
        }
    }

    /// Stable identity of the clip
    pub fn id(&self) -> &Path {
        &self.path
    }

    /// File name component of the path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Re-key the clip under a new path, refreshing the derived display name
    pub fn relocate(&mut self, path: PathBuf) {
        self.display_name = Self::name_from_path(&path);
        self.path = path;
    }

    fn name_from_path(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Get human-readable size string
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }

    /// Duration formatted as `M:SS.s` (or `H:MM:SS` for long clips)
    pub fn formatted_duration(&self) -> String {
        let total = if self.duration_secs.is_finite() && self.duration_secs > 0.0 {
            self.duration_secs
        } else {
            0.0
        };
        let whole = total.floor() as u64;
        let hours = whole / 3600;
        let minutes = (whole % 3600) / 60;
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, whole % 60)
        } else {
            let seconds = total - (whole - whole % 60) as f64;
            format!("{}:{:04.1}", minutes, seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(path: &str) -> Clip {
        Clip::new(PathBuf::from(path), Utc::now(), 12.5, 2048)
    }

    #[test]
    fn display_name_from_stem() {
        let clip = clip("/rec/rec_20240101_120000.mp4");
        assert_eq!(clip.display_name, "rec_20240101_120000");
        assert_eq!(clip.file_name(), "rec_20240101_120000.mp4");
        assert_eq!(clip.id(), Path::new("/rec/rec_20240101_120000.mp4"));
        assert!(clip.thumbnail.is_none());
    }

    #[test]
    fn relocate_updates_identity_and_name() {
        let mut clip = clip("/rec/a.mp4");
        clip.relocate(PathBuf::from("/rec/highlight.mp4"));
        assert_eq!(clip.path, PathBuf::from("/rec/highlight.mp4"));
        assert_eq!(clip.display_name, "highlight");
        assert_eq!(clip.duration_secs, 12.5);
    }

    #[test]
    fn human_readable_sizes() {
        let mut clip = clip("/rec/a.mp4");
        clip.size_bytes = 500;
        assert_eq!(clip.human_readable_size(), "500 B");
        clip.size_bytes = 2048;
        assert_eq!(clip.human_readable_size(), "2.0 KB");
        clip.size_bytes = 5 * 1024 * 1024;
        assert_eq!(clip.human_readable_size(), "5.0 MB");
    }

    #[test]
    fn formatted_durations() {
        let mut clip = clip("/rec/a.mp4");
        assert_eq!(clip.formatted_duration(), "0:12.5");
        clip.duration_secs = 75.0;
        assert_eq!(clip.formatted_duration(), "1:15.0");
        clip.duration_secs = 3725.0;
        assert_eq!(clip.formatted_duration(), "1:02:05");
        clip.duration_secs = f64::NAN;
        assert_eq!(clip.formatted_duration(), "0:00.0");
    }

    #[test]
    fn media_file_detection() {
        assert!(is_media_file(Path::new("/rec/a.mp4")));
        assert!(is_media_file(Path::new("/rec/a.MKV")));
        assert!(is_media_file(Path::new("b.webm")));
        assert!(!is_media_file(Path::new("/rec/a.mp4.part")));
        assert!(!is_media_file(Path::new("/rec/.hidden.mp4")));
        assert!(!is_media_file(Path::new("/rec/notes.txt")));
        assert!(!is_media_file(Path::new("/rec/thumbnails")));
    }

    #[test]
    fn serde_keeps_fields() {
        let mut original = clip("/rec/a.mp4");
        original.thumbnail = Some(PathBuf::from("/rec/thumbnails/a.mp4.png"));
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Clip = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
