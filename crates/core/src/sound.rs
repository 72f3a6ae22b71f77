use std::fmt;
use std::path::{Path, PathBuf};

use soundy_project::SoundData;

/// A named sound and the file it plays. Immutable; edits replace the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundRecord {
    name: String,
    path: PathBuf,
}

impl SoundRecord {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<SoundData> for SoundRecord {
    fn from(data: SoundData) -> Self {
        Self::new(data.name, data.path)
    }
}

impl From<&SoundRecord> for SoundData {
    fn from(record: &SoundRecord) -> Self {
        SoundData {
            name: record.name.clone(),
            path: record.path.clone(),
        }
    }
}

/// Stable identity of a sound: its board plus its name within that board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundKey {
    pub board: String,
    pub sound: String,
}

impl SoundKey {
    pub fn new(board: impl Into<String>, sound: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            sound: sound.into(),
        }
    }

    pub fn of(board: &str, record: &SoundRecord) -> Self {
        Self::new(board, record.name())
    }
}

impl fmt::Display for SoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.board, self.sound)
    }
}
