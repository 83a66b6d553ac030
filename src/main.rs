//! Nova Replay CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nova_replay::cli::{
    app::{finish, load_merged_config, resolve_recordings_dir, ClipLibrary, CommandError},
    args::{parse_backend, Cli, Commands, RecordArgs, RecordOptions},
    clips_cmd::handle_clips_command,
    config_cmd::handle_config_command,
    pid_file::PidFile,
    presenter::Presenter,
    record_app::run_record,
    recorder_cmd::{handle_stop_command, handle_status_command},
    trim_cmd::{handle_split_command, handle_trim_command},
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use nova_replay::domain::capture::CaptureArea;
use nova_replay::domain::config::AppConfig;
use nova_replay::domain::error::ConfigError;
use nova_replay::domain::recording::Duration;
use nova_replay::infrastructure::XdgConfigStore;

/// Environment variable holding the log filter
const LOG_ENV: &str = "NOVA_REPLAY_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("nova_replay=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let mut presenter = Presenter::new();

    // Directory flag applies to every command that touches clips
    let dir_config = AppConfig {
        recordings_dir: cli.dir.as_ref().map(|d| d.to_string_lossy().to_string()),
        ..Default::default()
    };

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e @ ConfigError::ValidationError { .. }) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Commands::Stop => {
            let config = load_merged_config(AppConfig::empty()).await;
            let grace = config.stop_timeout_or_default().as_std();
            finish(
                handle_stop_command(&PidFile::new(), grace, &presenter).await,
                &presenter,
            )
        }
        Commands::Status => {
            handle_status_command(&PidFile::new(), &presenter);
            ExitCode::SUCCESS
        }
        Commands::Record(args) => {
            let (options, config) = match record_options(args, dir_config).await {
                Ok(parsed) => parsed,
                Err(e) => return finish(Err(e), &presenter),
            };
            run_record(options, config).await
        }
        Commands::Clips { action } => {
            let config = load_merged_config(dir_config).await;
            let result = match ClipLibrary::open(&config).await {
                Ok(library) => handle_clips_command(action, &library, &presenter).await,
                Err(e) => Err(e),
            };
            finish(result, &presenter)
        }
        Commands::Trim { clip, start, end } => {
            let config = load_merged_config(dir_config).await;
            let result = match ClipLibrary::open(&config).await {
                Ok(library) => {
                    handle_trim_command(&clip, start, end, &library, &mut presenter).await
                }
                Err(e) => Err(e),
            };
            finish(result, &presenter)
        }
        Commands::Split { clip, at } => {
            let config = load_merged_config(dir_config).await;
            let result = match ClipLibrary::open(&config).await {
                Ok(library) => handle_split_command(&clip, at, &library, &mut presenter).await,
                Err(e) => Err(e),
            };
            finish(result, &presenter)
        }
    }
}

/// Merge record flags into the configuration and validate them
async fn record_options(
    args: RecordArgs,
    dir_config: AppConfig,
) -> Result<(RecordOptions, AppConfig), CommandError> {
    let backend = args
        .backend
        .as_deref()
        .map(parse_backend)
        .transpose()
        .map_err(CommandError::Usage)?;

    let max_duration = args
        .duration
        .as_deref()
        .map(|s| s.parse::<Duration>())
        .transpose()
        .map_err(|e| CommandError::Usage(format!("Invalid duration: {}", e)))?;

    let region = args
        .region
        .as_deref()
        .map(|s| s.parse::<CaptureArea>())
        .transpose()
        .map_err(|e| CommandError::Usage(format!("Invalid region: {}", e)))?;

    let cli_config = AppConfig {
        filename_template: args.template,
        region: region.map(|r| r.to_string()),
        backend: backend.map(|b| b.to_string()),
        thumbnails: args.no_thumbnail.then_some(false),
        notify: args.notify.then_some(true),
        ..dir_config
    };
    let config = load_merged_config(cli_config).await;

    let options = RecordOptions {
        recordings_dir: resolve_recordings_dir(&config),
        filename_template: config.filename_template_or_default().to_string(),
        max_duration,
        stop_timeout: config.stop_timeout_or_default(),
        notify: config.notify_or_default(),
    };
    Ok((options, config))
}
