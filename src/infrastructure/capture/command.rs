//! User-configured command capture backend

use std::path::Path;

use tokio::process::Child;

use crate::application::ports::{CaptureBackend, CaptureError};
use crate::domain::capture::CaptureBackendKind;

use super::process::{interrupt, spawn_capture};

/// Placeholder replaced by the output path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs an arbitrary program as the capture tool.
///
/// Every `{output}` in the arguments becomes the output path; without a
/// placeholder the path is appended as the last argument. The program must
/// finalize its file on SIGINT.
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line (no shell quoting)
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(OUTPUT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(OUTPUT_PLACEHOLDER, &output)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(output.to_string());
        }
        args
    }
}

impl CaptureBackend for CommandBackend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::Custom
    }

    fn name(&self) -> String {
        format!("custom ({})", self.program)
    }

    fn start(&self, output: &Path) -> Result<Child, CaptureError> {
        spawn_capture(&self.program, &self.build_args(output))
    }

    fn request_stop(&self, child: &Child) -> Result<(), CaptureError> {
        interrupt(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_line() {
        let backend = CommandBackend::from_command_line("  gpu-screen-recorder -w screen -o {output} ").unwrap();
        assert_eq!(backend.program(), "gpu-screen-recorder");
        assert_eq!(
            backend.build_args(Path::new("/rec/a.mp4")),
            vec!["-w", "screen", "-o", "/rec/a.mp4"]
        );
        assert_eq!(backend.name(), "custom (gpu-screen-recorder)");
    }

    #[test]
    fn appends_output_without_placeholder() {
        let backend = CommandBackend::from_command_line("recorder --fast").unwrap();
        assert_eq!(
            backend.build_args(Path::new("/rec/a.mp4")),
            vec!["--fast", "/rec/a.mp4"]
        );
    }

    #[test]
    fn placeholder_inside_argument() {
        let backend = CommandBackend::new("rec", vec!["--file={output}".to_string()]);
        assert_eq!(
            backend.build_args(Path::new("/rec/a.mp4")),
            vec!["--file=/rec/a.mp4"]
        );
    }

    #[test]
    fn empty_command_line_is_none() {
        assert!(CommandBackend::from_command_line("   ").is_none());
    }
}
