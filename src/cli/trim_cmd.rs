//! Trim command handler

use std::sync::Arc;

use crate::application::TrimEngine;
use crate::infrastructure::FfmpegStreamCopier;

use super::app::{ClipLibrary, CommandError};
use super::presenter::Presenter;

/// Handle `trim <clip> --start --end`
pub async fn handle_trim_command(
    clip: &str,
    start: f64,
    end: f64,
    library: &ClipLibrary,
    presenter: &mut Presenter,
) -> Result<(), CommandError> {
    library.sync().await?;
    let source = library.resolve_clip(clip)?;

    // Thumbnails run inline below so the process outlives the job
    let engine = TrimEngine::new(
        Arc::clone(&library.store),
        Arc::new(FfmpegStreamCopier::new()),
        None,
    );

    presenter.start_spinner(&format!(
        "Trimming {} ({:.1}s to {:.1}s)...",
        source.file_name(),
        start,
        end
    ));

    match engine.trim(&source, start, end).await {
        Ok(trimmed) => {
            presenter.spinner_success(&format!(
                "Created {} ({})",
                trimmed.file_name(),
                trimmed.formatted_duration()
            ));
            library.thumbnail(&trimmed, presenter).await;
            presenter.output(&trimmed.path.display().to_string());
            Ok(())
        }
        Err(e) => {
            presenter.stop_spinner();
            Err(CommandError::from_category(e.category(), e.to_string()))
        }
    }
}

/// Handle `split <clip> --at`
pub async fn handle_split_command(
    clip: &str,
    at: f64,
    library: &ClipLibrary,
    presenter: &mut Presenter,
) -> Result<(), CommandError> {
    library.sync().await?;
    let source = library.resolve_clip(clip)?;

    let engine = TrimEngine::new(
        Arc::clone(&library.store),
        Arc::new(FfmpegStreamCopier::new()),
        None,
    );

    presenter.start_spinner(&format!("Splitting {} at {:.1}s...", source.file_name(), at));

    match engine.split(&source, at).await {
        Ok((first, second)) => {
            presenter.spinner_success(&format!(
                "Created {} ({}) and {} ({})",
                first.file_name(),
                first.formatted_duration(),
                second.file_name(),
                second.formatted_duration()
            ));
            for part in [&first, &second] {
                library.thumbnail(part, presenter).await;
                presenter.output(&part.path.display().to_string());
            }
            Ok(())
        }
        Err(e) => {
            presenter.stop_spinner();
            Err(CommandError::from_category(e.category(), e.to_string()))
        }
    }
}
