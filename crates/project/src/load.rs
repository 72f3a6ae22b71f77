use crate::{BoardData, ProjectError};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the board document at `path`.
///
/// A missing file surfaces as `ProjectError::Io` with `NotFound`; check it with
/// [`ProjectError::is_missing`].
pub fn load_boards(path: &Path) -> Result<Vec<BoardData>, ProjectError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let boards: Vec<BoardData> =
        serde_json::from_reader(reader).map_err(ProjectError::Deserialize)?;

    tracing::debug!(path = %path.display(), boards = boards.len(), "loaded board document");
    Ok(boards)
}
