//! Clip management command handlers

use super::app::{ClipLibrary, CommandError};
use super::args::ClipsAction;
use super::presenter::Presenter;

/// Handle clips subcommand
pub async fn handle_clips_command(
    action: ClipsAction,
    library: &ClipLibrary,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    // Pick up files added or removed behind our back
    let report = library.sync().await?;

    match action {
        ClipsAction::List => handle_list(library, presenter),
        ClipsAction::Reconcile => {
            for path in &report.pruned {
                presenter.info(&format!("Pruned {}", path.display()));
            }
            for path in &report.adopted {
                presenter.info(&format!("Adopted {}", path.display()));
                if let Some(clip) = library.store.get(path) {
                    library.thumbnail(&clip, presenter).await;
                }
            }
            presenter.success(&format!(
                "{} clip(s): {} adopted, {} pruned",
                library.store.len(),
                report.adopted.len(),
                report.pruned.len()
            ));
            Ok(())
        }
        ClipsAction::Delete { clip } => {
            let clip = library.resolve_clip(&clip)?;
            library
                .store
                .delete(&clip.path)
                .await
                .map_err(|e| CommandError::from_category(e.category(), e.to_string()))?;
            presenter.success(&format!("Deleted {}", clip.file_name()));
            Ok(())
        }
        ClipsAction::Rename { clip, name } => {
            let clip = library.resolve_clip(&clip)?;
            let renamed = library
                .store
                .rename(&clip.path, &name)
                .await
                .map_err(|e| CommandError::from_category(e.category(), e.to_string()))?;
            presenter.success(&format!(
                "Renamed {} to {}",
                clip.file_name(),
                renamed.file_name()
            ));
            presenter.output(&renamed.path.display().to_string());
            Ok(())
        }
        ClipsAction::SaveAs {
            clip,
            destination,
            force,
        } => {
            let clip = library.resolve_clip(&clip)?;
            let saved = library
                .store
                .save_as(&clip.path, &destination, force)
                .await
                .map_err(|e| CommandError::from_category(e.category(), e.to_string()))?;
            presenter.success(&format!("Saved a copy of {}", clip.file_name()));
            presenter.output(&saved.display().to_string());
            Ok(())
        }
    }
}

fn handle_list(library: &ClipLibrary, presenter: &Presenter) -> Result<(), CommandError> {
    let clips = library.store.list();
    if clips.is_empty() {
        presenter.info(&format!("No clips in {}", library.directory().display()));
        return Ok(());
    }
    for clip in &clips {
        presenter.clip_row(clip);
    }
    Ok(())
}
