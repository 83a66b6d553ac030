//! Record command runner

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::debug;

use crate::application::ports::{Notifier, RecordingNotice};
use crate::application::{
    CaptureExit, RecordingSession, SessionConfig, SessionEvent, StopError,
};
use crate::domain::clip::Clip;
use crate::domain::config::AppConfig;
use crate::infrastructure::{create_notifier, CaptureSettings, EnvironmentBackendResolver};

use super::app::{ClipLibrary, CommandError, EXIT_ERROR, EXIT_SUCCESS};
use super::args::RecordOptions;
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::StopSignalHandler;

const PROGRESS_TICK: StdDuration = StdDuration::from_millis(250);

/// How the recording loop ended
enum Outcome {
    Stop(String),
    Crashed {
        exit: CaptureExit,
        salvaged: Option<Clip>,
    },
}

/// Run the record command until stopped, then print the clip path
pub async fn run_record(options: RecordOptions, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let mut pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut signals = match StopSignalHandler::new() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let library = match ClipLibrary::open(&config).await {
        Ok(library) => library,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(e.exit_code());
        }
    };

    let notifier = create_notifier(options.notify);
    let resolver = EnvironmentBackendResolver::new(CaptureSettings::from_config(&config));
    // Thumbnails are generated inline below so the process outlives the job
    let session = RecordingSession::new(
        Arc::new(resolver),
        Arc::clone(&library.store),
        None,
        SessionConfig {
            grace_period: options.stop_timeout,
            ..Default::default()
        },
    );
    let mut events = session.subscribe();

    let handle = match session
        .start(&options.recordings_dir, &options.filename_template)
        .await
    {
        Ok(handle) => handle,
        Err(e) => {
            let error = CommandError::from_category(e.category(), e.to_string());
            presenter.error(&format!("Failed to start recording: {}", error));
            return ExitCode::from(error.exit_code());
        }
    };

    debug!(pid = ?handle.pid, "Capture running");
    presenter.info(&format!(
        "Recording with {} to {}",
        handle.backend,
        handle.output_path.display()
    ));
    let _ = notifier
        .notify(&RecordingNotice::Started {
            backend: handle.backend.clone(),
        })
        .await;

    let limit = options.max_duration.map(|d| d.as_std());
    presenter.start_spinner("Recording...");

    let mut ticker = interval(PROGRESS_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let outcome = loop {
        tokio::select! {
            signal = signals.recv() => {
                let reason = signal
                    .map(|s| format!("Received {}", s.as_str()))
                    .unwrap_or_else(|| "Signal handler closed".to_string());
                break Outcome::Stop(reason);
            }
            event = events.recv() => match event {
                Ok(SessionEvent::CaptureCrashed { exit, salvaged }) => {
                    break Outcome::Crashed { exit, salvaged };
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break Outcome::Stop("Session closed".to_string()),
            },
            _ = ticker.tick() => {
                let elapsed = session.status().elapsed.unwrap_or_default();
                presenter.update_recording_progress(elapsed, limit);
                if limit.is_some_and(|limit| elapsed >= limit) {
                    break Outcome::Stop("Duration limit reached".to_string());
                }
            }
        }
    };

    let outcome = match outcome {
        Outcome::Stop(reason) => {
            debug!("{}", reason);
            presenter.update_spinner("Finishing recording...");
            match session.stop().await {
                Ok(clip) => {
                    presenter.spinner_success(&format!(
                        "Saved {} ({}, {})",
                        clip.file_name(),
                        clip.formatted_duration(),
                        clip.human_readable_size()
                    ));
                    finish_clip(&library, &clip, &presenter).await;
                    let _ = notifier
                        .notify(&RecordingNotice::Saved {
                            file_name: clip.file_name(),
                            duration: clip.formatted_duration(),
                        })
                        .await;
                    return ExitCode::from(EXIT_SUCCESS);
                }
                // The capture died while the stop was on its way
                Err(StopError::NotRecording) => {
                    match wait_for_crash(&mut events, options.stop_timeout.as_std()).await {
                        Some(crashed) => crashed,
                        None => {
                            presenter.spinner_fail("Recording was not running");
                            return ExitCode::from(EXIT_ERROR);
                        }
                    }
                }
                Err(e) => {
                    presenter.spinner_fail(&format!("Recording could not be saved: {}", e));
                    let _ = notifier
                        .notify(&RecordingNotice::Failed {
                            reason: e.to_string(),
                        })
                        .await;
                    return ExitCode::from(EXIT_ERROR);
                }
            }
        }
        crashed => crashed,
    };

    if let Outcome::Crashed { exit, salvaged } = outcome {
        presenter.spinner_fail(&format!("Capture tool crashed ({})", exit));
        match &salvaged {
            Some(clip) => {
                presenter.warn(&format!(
                    "Partial recording salvaged ({})",
                    clip.formatted_duration()
                ));
                finish_clip(&library, clip, &presenter).await;
            }
            None => presenter.warn("Nothing was recorded"),
        }
        let _ = notifier
            .notify(&RecordingNotice::Crashed {
                salvaged: salvaged.as_ref().map(|clip| clip.file_name()),
            })
            .await;
    }

    ExitCode::from(EXIT_ERROR)
}

async fn finish_clip(library: &ClipLibrary, clip: &Clip, presenter: &Presenter) {
    library.thumbnail(clip, presenter).await;
    presenter.output(&clip.path.display().to_string());
}

async fn wait_for_crash(
    events: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
    within: StdDuration,
) -> Option<Outcome> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(SessionEvent::CaptureCrashed { exit, salvaged }) => {
                    return Some(Outcome::Crashed { exit, salvaged })
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    };
    timeout(within, wait).await.ok().flatten()
}
