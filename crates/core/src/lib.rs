pub mod board;
pub mod controller;
pub mod error;
pub mod registry;
pub mod sound;
pub mod store;

#[cfg(test)]
mod fake;

use std::path::PathBuf;

pub use board::Board;
pub use controller::{BoardController, Redraw, UiEvent};
pub use error::BoardError;
pub use registry::{PlaybackRegistry, PlaybackState};
pub use sound::{SoundKey, SoundRecord};
pub use store::{BoardStore, DEFAULT_BOARD};

pub use soundy_decode::{SUPPORTED_EXTENSIONS, is_supported};
pub use soundy_engine::AudioEngineHandle;
pub use soundy_project::{DOCUMENT_FILE, ProjectError};
pub use soundy_transport::{AudioBackend, ClipId};

/// Open the board document at `path` and play through the default output device.
pub fn open_with_engine(
    path: impl Into<PathBuf>,
) -> anyhow::Result<(BoardController<AudioEngineHandle>, Option<BoardError>)> {
    let engine = soundy_engine::start()?;
    Ok(BoardController::open(path, engine))
}
