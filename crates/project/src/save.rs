use crate::{BoardData, ProjectError};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write the full board document, replacing any previous version.
///
/// The document is written to a temporary file next to `path` and renamed over
/// it, so readers only ever see the old or the new document.
pub fn save_boards(path: &Path, boards: &[BoardData]) -> Result<(), ProjectError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, boards).map_err(ProjectError::Serialize)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ProjectError::Io(e.error))?;

    tracing::debug!(path = %path.display(), boards = boards.len(), "saved board document");
    Ok(())
}
