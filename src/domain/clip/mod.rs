//! Clip domain module

mod entity;
mod name;
mod trim_range;

pub use entity::{is_media_file, Clip, MEDIA_EXTENSIONS};
pub use name::ClipName;
pub use trim_range::TrimRange;
