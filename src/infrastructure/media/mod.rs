//! ffmpeg/ffprobe media adapters

mod ffmpeg_copy;
mod ffmpeg_thumbnail;
mod ffprobe;

pub use ffmpeg_copy::FfmpegStreamCopier;
pub use ffmpeg_thumbnail::{FfmpegThumbnailer, THUMBNAIL_SIZE};
pub use ffprobe::FfprobeProbe;

/// Last non-empty line of a tool's stderr
pub(crate) fn last_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string()
}
