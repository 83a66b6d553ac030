//! Backend resolution from the running environment

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{BackendResolver, CaptureBackend};
use crate::domain::capture::{
    fallback_backend, select_backend, BackendSelectionError, CaptureArea, CaptureBackendKind,
    CaptureBackendPreference, DisplayServer,
};
use crate::domain::config::AppConfig;

use super::command::CommandBackend;
use super::ffmpeg_pipewire::{ffmpeg_supports_pipewire, FfmpegPipewireBackend};
use super::ffmpeg_x11::FfmpegX11Backend;
use super::process::is_tool_available;
use super::wf_recorder::WfRecorderBackend;

/// Settings that shape backend resolution
#[derive(Debug, Clone, Default)]
pub struct CaptureSettings {
    pub preference: CaptureBackendPreference,
    pub custom_command: Option<String>,
    pub fps: u32,
    pub region: Option<CaptureArea>,
    pub wayland_output: Option<String>,
    pub x11_display: Option<String>,
}

impl CaptureSettings {
    /// Extract capture settings from the merged configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            preference: config.backend_or_default(),
            custom_command: config.custom_command.clone(),
            fps: config.fps_or_default(),
            region: config.region_or_default(),
            wayland_output: config.wayland_output().map(str::to_string),
            x11_display: config.x11_display().map(str::to_string),
        }
    }
}

/// Resolves a backend by detecting the display server and installed tools
pub struct EnvironmentBackendResolver {
    settings: CaptureSettings,
}

impl EnvironmentBackendResolver {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    fn custom_backend(&self) -> Option<CommandBackend> {
        self.settings
            .custom_command
            .as_deref()
            .and_then(CommandBackend::from_command_line)
    }

    async fn available_tools(&self, custom: Option<&CommandBackend>) -> HashSet<String> {
        let mut candidates = vec!["wf-recorder".to_string(), "ffmpeg".to_string()];
        if let Some(custom) = custom {
            candidates.push(custom.program().to_string());
        }

        let mut found = HashSet::new();
        for tool in candidates {
            if is_tool_available(&tool).await {
                found.insert(tool);
            }
        }
        found
    }

    /// Instantiate a resolved backend kind
    async fn build(
        &self,
        kind: CaptureBackendKind,
        custom: Option<CommandBackend>,
    ) -> Result<Arc<dyn CaptureBackend>, BackendSelectionError> {
        Ok(match kind {
            CaptureBackendKind::WfRecorder => Arc::new(
                WfRecorderBackend::new(self.settings.wayland_output.clone())
                    .with_area(self.settings.region),
            ),
            CaptureBackendKind::FfmpegX11 => {
                let x_display = self
                    .settings
                    .x11_display
                    .clone()
                    .or_else(|| std::env::var("DISPLAY").ok())
                    .unwrap_or_else(|| ":0".to_string());
                Arc::new(
                    FfmpegX11Backend::detect(x_display, self.settings.fps)
                        .await
                        .with_area(self.settings.region),
                )
            }
            CaptureBackendKind::FfmpegPipewire => {
                if self.settings.region.is_some() {
                    debug!("PipeWire capture records the portal's selection; region ignored");
                }
                Arc::new(FfmpegPipewireBackend::new(self.settings.fps))
            }
            CaptureBackendKind::Custom => match custom {
                Some(custom) => Arc::new(custom),
                None => return Err(BackendSelectionError::CustomCommandMissing),
            },
        })
    }
}

#[async_trait]
impl BackendResolver for EnvironmentBackendResolver {
    async fn resolve(&self) -> Result<Arc<dyn CaptureBackend>, BackendSelectionError> {
        let server = DisplayServer::detect();
        let custom = self.custom_backend();
        let tools = self.available_tools(custom.as_ref()).await;

        let kind = select_backend(
            self.settings.preference,
            server,
            custom.as_ref().map(CommandBackend::program),
            |tool| tools.contains(tool),
        )?;
        debug!(display_server = %server, backend = %kind, "Resolved capture backend");

        self.build(kind, custom).await
    }

    async fn fallback(&self, failed: CaptureBackendKind) -> Option<Arc<dyn CaptureBackend>> {
        if failed != CaptureBackendKind::WfRecorder {
            return None;
        }
        let server = DisplayServer::detect();
        let ffmpeg_available = is_tool_available("ffmpeg").await;
        let has_pipewire =
            server == DisplayServer::Wayland && ffmpeg_available && ffmpeg_supports_pipewire().await;

        let kind = fallback_backend(failed, server, ffmpeg_available, has_pipewire)?;
        debug!(display_server = %server, backend = %kind, "Resolved fallback backend");
        self.build(kind, None).await.ok()
    }
}

/// Always hands out the same backend
pub struct FixedBackendResolver {
    backend: Arc<dyn CaptureBackend>,
}

impl FixedBackendResolver {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BackendResolver for FixedBackendResolver {
    async fn resolve(&self) -> Result<Arc<dyn CaptureBackend>, BackendSelectionError> {
        Ok(Arc::clone(&self.backend))
    }
}
