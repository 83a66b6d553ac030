//! Recording domain module

mod duration;
mod output_name;

pub use duration::{Duration, DEFAULT_STOP_TIMEOUT_SECS};
pub use output_name::{
    render_file_name, unique_path, InvalidTemplate, DEFAULT_FILENAME_TEMPLATE,
};
