use std::path::PathBuf;

use soundy_project::ProjectError;

use crate::sound::SoundKey;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("A board named '{0}' already exists")]
    DuplicateBoard(String),

    #[error("Board '{board}' already has a sound named '{sound}'")]
    DuplicateSound { board: String, sound: String },

    #[error("No board named '{0}'")]
    UnknownBoard(String),

    #[error("Board '{board}' has no sound named '{sound}'")]
    UnknownSound { board: String, sound: String },

    #[error("'{}' is not a supported sound file ({})", .0.display(), soundy_decode::SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedFile(PathBuf),

    #[error("'{0}' cannot be deleted")]
    ProtectedBoard(String),

    /// The in-memory change was applied but could not be written to disk.
    #[error("Changes may not survive a restart: {0}")]
    Persistence(#[from] ProjectError),

    #[error("Cannot load audio for '{sound}': {source}")]
    Playback {
        sound: SoundKey,
        source: anyhow::Error,
    },
}

impl BoardError {
    /// Rejected input; nothing changed and nothing was saved.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BoardError::EmptyName
                | BoardError::DuplicateBoard(_)
                | BoardError::DuplicateSound { .. }
                | BoardError::UnsupportedFile(_)
        )
    }

    /// The store changed in memory even though this error was returned.
    pub fn state_changed(&self) -> bool {
        matches!(self, BoardError::Persistence(_))
    }
}
