//! wf-recorder capture backend (Wayland)

use std::path::Path;

use tokio::process::Child;

use crate::application::ports::{CaptureBackend, CaptureError};
use crate::domain::capture::{CaptureArea, CaptureBackendKind};

use super::process::{interrupt, spawn_capture};

/// Records a Wayland output with wf-recorder
pub struct WfRecorderBackend {
    /// Output to record (`-o`); wf-recorder picks one when unset
    output_name: Option<String>,
    area: Option<CaptureArea>,
}

impl WfRecorderBackend {
    pub fn new(output_name: Option<String>) -> Self {
        Self {
            output_name,
            area: None,
        }
    }

    /// Record only `area` (`-g WxH+X+Y`)
    pub fn with_area(mut self, area: Option<CaptureArea>) -> Self {
        self.area = area;
        self
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        let mut args = vec!["-f".to_string(), output.to_string_lossy().to_string()];
        if let Some(name) = &self.output_name {
            args.push("-o".to_string());
            args.push(name.clone());
        }
        if let Some(area) = &self.area {
            args.push("-g".to_string());
            args.push(area.to_string());
        }
        args
    }
}

impl CaptureBackend for WfRecorderBackend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::WfRecorder
    }

    fn start(&self, output: &Path) -> Result<Child, CaptureError> {
        spawn_capture("wf-recorder", &self.build_args(output))
    }

    fn request_stop(&self, child: &Child) -> Result<(), CaptureError> {
        interrupt(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_without_output_name() {
        let backend = WfRecorderBackend::new(None);
        assert_eq!(
            backend.build_args(Path::new("/rec/a.mp4")),
            vec!["-f", "/rec/a.mp4"]
        );
        assert_eq!(backend.name(), "wf-recorder");
    }

    #[test]
    fn args_with_output_name() {
        let backend = WfRecorderBackend::new(Some("DP-1".to_string()));
        assert_eq!(
            backend.build_args(Path::new("/rec/a.mp4")),
            vec!["-f", "/rec/a.mp4", "-o", "DP-1"]
        );
    }

    #[test]
    fn args_with_region() {
        let backend = WfRecorderBackend::new(None).with_area("1280x720+10+20".parse().ok());
        assert_eq!(
            backend.build_args(Path::new("/rec/a.mp4")),
            vec!["-f", "/rec/a.mp4", "-g", "1280x720+10+20"]
        );
    }
}
