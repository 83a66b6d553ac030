//! Timestamp-derived output file names

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use thiserror::Error;

/// Default recording file name template (strftime syntax)
pub const DEFAULT_FILENAME_TEMPLATE: &str = "rec_%Y%m%d_%H%M%S.mp4";

/// Error when a file name template cannot produce a usable file name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid file name template \"{template}\": {reason}")]
pub struct InvalidTemplate {
    pub template: String,
    pub reason: String,
}

/// Render a strftime template into a bare file name.
///
/// The result must be a single path component with an extension, so the
/// capture tool can infer the container from it.
pub fn render_file_name<Tz>(template: &str, now: &DateTime<Tz>) -> Result<String, InvalidTemplate>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let invalid = |reason: &str| InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut rendered = String::new();
    write!(rendered, "{}", now.format(template))
        .map_err(|_| invalid("not a valid strftime pattern"))?;

    let rendered = rendered.trim().to_string();
    if rendered.is_empty() || rendered == "." || rendered == ".." {
        return Err(invalid("renders to an empty name"));
    }
    if rendered.contains('/') || rendered.contains('\0') {
        return Err(invalid("must render to a file name, not a path"));
    }
    if Path::new(&rendered).extension().is_none() {
        return Err(invalid("must include a file extension such as .mp4"));
    }

    Ok(rendered)
}

/// Pick a path in `dir` for `file_name` that does not collide with an
/// existing entry, appending `_1`, `_2`, ... before the extension.
pub fn unique_path(dir: &Path, file_name: &str, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let candidate = dir.join(file_name);
    if !exists(&candidate) {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut index = 1u32;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, index, ext));
        if !exists(&candidate) {
            return candidate;
        }
        index += 1;
    }
}
