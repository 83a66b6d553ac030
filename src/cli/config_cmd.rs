//! Config command handler

use chrono::Local;

use crate::application::ports::ConfigStore;
use crate::domain::capture::{CaptureArea, CaptureBackendPreference};
use crate::domain::config::{AppConfig, LinuxConfig};
use crate::domain::error::ConfigError;
use crate::domain::recording::{render_file_name, Duration};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let path = store.write_defaults().await?;
    presenter.success(&format!("Config file created at: {}", path.display()));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.read().await?;
    apply_value(&mut config, key, value)?;
    store.write(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.read().await?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.read().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.location().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(invalid(
            key,
            format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        ))
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    match key {
        "recordings_dir" => {
            if value.is_empty() {
                return Err(invalid(key, "Value must not be empty"));
            }
            config.recordings_dir = Some(value.to_string());
        }
        "filename_template" => {
            render_file_name(value, &Local::now()).map_err(|e| invalid(key, e.to_string()))?;
            config.filename_template = Some(value.to_string());
        }
        "backend" => {
            let preference = value
                .parse::<CaptureBackendPreference>()
                .map_err(|e| invalid(key, e.to_string()))?;
            config.backend = Some(preference.to_string());
        }
        "fps" => {
            let fps = value
                .parse::<u32>()
                .ok()
                .filter(|&fps| fps > 0)
                .ok_or_else(|| invalid(key, "Value must be a positive whole number"))?;
            config.fps = Some(fps);
        }
        "region" => {
            let area = value
                .parse::<CaptureArea>()
                .map_err(|e| invalid(key, e.to_string()))?;
            config.region = Some(area.to_string());
        }
        "stop_timeout" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(key, e.to_string()))?;
            config.stop_timeout = Some(value.to_string());
        }
        "thumbnails" => config.thumbnails = Some(parse_bool(key, value)?),
        "notify" => config.notify = Some(parse_bool(key, value)?),
        "custom_command" => {
            if value.is_empty() {
                return Err(invalid(key, "Value must not be empty"));
            }
            config.custom_command = Some(value.to_string());
        }
        "linux.wayland_output" => {
            config.linux.get_or_insert_with(LinuxConfig::default).wayland_output =
                Some(value.to_string());
        }
        "linux.x11_display" => {
            config.linux.get_or_insert_with(LinuxConfig::default).x11_display =
                Some(value.to_string());
        }
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "recordings_dir" => config.recordings_dir.clone(),
        "filename_template" => config.filename_template.clone(),
        "backend" => config.backend.clone(),
        "fps" => config.fps.map(|v| v.to_string()),
        "region" => config.region.clone(),
        "stop_timeout" => config.stop_timeout.clone(),
        "thumbnails" => config.thumbnails.map(|b| b.to_string()),
        "notify" => config.notify.map(|b| b.to_string()),
        "custom_command" => config.custom_command.clone(),
        "linux.wayland_output" => config.wayland_output().map(str::to_string),
        "linux.x11_display" => config.x11_display().map(str::to_string),
        _ => None,
    }
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, "Value must be 'true' or 'false'")),
    }
}
