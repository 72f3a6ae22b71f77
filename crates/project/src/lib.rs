mod load;
mod save;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use load::load_boards;
pub use save::save_boards;

/// File name of the board document inside the data directory.
pub const DOCUMENT_FILE: &str = "boards.json";

/// One board as it appears in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardData {
    pub board: String,
    #[serde(default)]
    pub sounds: Vec<SoundData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundData {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Malformed board document: {0}")]
    Deserialize(#[source] serde_json::Error),
}

impl ProjectError {
    /// True when the document simply does not exist yet.
    pub fn is_missing(&self) -> bool {
        matches!(self, ProjectError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
