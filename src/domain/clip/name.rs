//! Clip name value object

use std::ffi::OsStr;
use std::path::Path;

use crate::domain::error::InvalidClipName;

use super::entity::MEDIA_EXTENSIONS;

/// A validated bare file name supplied for a rename.
///
/// Unless the name ends in a known media extension, the extension of the
/// clip being renamed is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipName(String);

impl ClipName {
    /// Validate user input as a clip name
    pub fn parse(input: &str) -> Result<Self, InvalidClipName> {
        let invalid = |reason| InvalidClipName {
            input: input.to_string(),
            reason,
        };

        let name = input.trim();
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name == "." || name == ".." {
            return Err(invalid("name is a relative directory reference"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(invalid("name must not contain path separators"));
        }
        if name.contains('\0') {
            return Err(invalid("name must not contain NUL bytes"));
        }
        if name.starts_with('.') {
            return Err(invalid("name must not start with a dot"));
        }

        Ok(Self(name.to_string()))
    }

    /// The name as entered (trimmed)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final file name, borrowing `original_extension` unless a media
    /// extension was given
    pub fn file_name(&self, original_extension: Option<&OsStr>) -> String {
        if self.has_media_extension() {
            return self.0.clone();
        }
        match original_extension {
            Some(ext) => format!("{}.{}", self.0, ext.to_string_lossy()),
            None => self.0.clone(),
        }
    }

    fn has_media_extension(&self) -> bool {
        Path::new(&self.0)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_original_extension() {
        let name = ClipName::parse("clip1").unwrap();
        assert_eq!(name.file_name(Some(OsStr::new("mp4"))), "clip1.mp4");
    }

    #[test]
    fn explicit_extension_wins() {
        let name = ClipName::parse("clip1.mkv").unwrap();
        assert_eq!(name.file_name(Some(OsStr::new("mp4"))), "clip1.mkv");
    }

    #[test]
    fn dotted_name_keeps_original_extension() {
        let name = ClipName::parse("match 1.5").unwrap();
        assert_eq!(name.file_name(Some(OsStr::new("mp4"))), "match 1.5.mp4");

        let upper = ClipName::parse("final.MOV").unwrap();
        assert_eq!(upper.file_name(Some(OsStr::new("mp4"))), "final.MOV");
    }

    #[test]
    fn trims_whitespace() {
        let name = ClipName::parse("  best moment ").unwrap();
        assert_eq!(name.as_str(), "best moment");
        assert_eq!(name.file_name(None), "best moment");
    }

    #[test]
    fn rejects_invalid_names() {
        for input in ["", "   ", ".", "..", "a/b", "a\\b", ".hidden"] {
            let err = ClipName::parse(input).unwrap_err();
            assert_eq!(err.input, input);
        }
    }
}
