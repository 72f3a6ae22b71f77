use std::path::{Path, PathBuf};

use soundy_transport::AudioBackend;

use crate::error::BoardError;
use crate::registry::{PlaybackRegistry, PlaybackState};
use crate::sound::{SoundKey, SoundRecord};
use crate::store::{BoardStore, DEFAULT_BOARD};

/// Everything the UI can ask of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    AddBoard(String),
    DeleteBoard(String),
    SelectBoard(String),
    /// Added to the current board.
    AddSound { name: String, path: PathBuf },
    DeleteSound { board: String, sound: String },
    /// Rename a sound and/or point it at another file, keeping its place.
    EditSound {
        board: String,
        sound: String,
        name: String,
        path: PathBuf,
    },
    Play(SoundKey),
    ToggleLoop(SoundKey),
    Stop(SoundKey),
}

/// What the UI has to re-read after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Nothing,
    /// The current board's sounds or their playback markers.
    Sounds,
    /// The board list and the current board.
    Boards,
}

/// Applies UI events to the store and the playback registry.
///
/// Destructive events stop the affected sounds before the store changes. Board
/// selection leaves other boards' sounds playing.
pub struct BoardController<B: AudioBackend> {
    store: BoardStore,
    playback: PlaybackRegistry<B>,
}

impl<B: AudioBackend> BoardController<B> {
    pub fn new(store: BoardStore, backend: B) -> Self {
        Self {
            store,
            playback: PlaybackRegistry::new(backend),
        }
    }

    /// Load the board document at `path`. A load problem comes back alongside a
    /// usable controller.
    pub fn open(path: impl Into<PathBuf>, backend: B) -> (Self, Option<BoardError>) {
        let (store, err) = BoardStore::load(path);
        (Self::new(store, backend), err)
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn playback(&self) -> &PlaybackRegistry<B> {
        &self.playback
    }

    pub fn state_of(&self, key: &SoundKey) -> PlaybackState {
        self.playback.state(key)
    }

    pub fn handle(&mut self, event: UiEvent) -> Result<Redraw, BoardError> {
        tracing::debug!(?event, "ui event");
        match event {
            UiEvent::AddBoard(name) => self.on_add_board(&name).map(|_| Redraw::Boards),
            UiEvent::DeleteBoard(name) => self.on_delete_board(&name).map(|_| Redraw::Boards),
            UiEvent::SelectBoard(name) => self.on_select_board(&name).map(|_| Redraw::Boards),
            UiEvent::AddSound { name, path } => {
                self.on_add_sound(&name, &path).map(|_| Redraw::Sounds)
            }
            UiEvent::DeleteSound { board, sound } => {
                let removed = self.on_delete_sound(&board, &sound)?;
                let visible = board == self.store.current_board_name();
                Ok(if removed && visible {
                    Redraw::Sounds
                } else {
                    Redraw::Nothing
                })
            }
            UiEvent::EditSound {
                board,
                sound,
                name,
                path,
            } => self
                .on_edit_sound(&board, &sound, &name, &path)
                .map(|_| Redraw::Sounds),
            UiEvent::Play(key) => self.on_play(&key).map(|_| Redraw::Sounds),
            UiEvent::ToggleLoop(key) => self.on_toggle_loop(&key).map(|_| Redraw::Sounds),
            UiEvent::Stop(key) => {
                self.on_stop(&key);
                Ok(Redraw::Sounds)
            }
        }
    }

    pub fn on_add_board(&mut self, name: &str) -> Result<(), BoardError> {
        self.store.add_board(name)
    }

    pub fn on_delete_board(&mut self, name: &str) -> Result<(), BoardError> {
        if name == DEFAULT_BOARD {
            return Err(BoardError::ProtectedBoard(name.to_string()));
        }
        if !self.store.contains(name) {
            return Err(BoardError::UnknownBoard(name.to_string()));
        }

        self.playback.forget_board(name);
        self.store.remove_board(name).map(|_| ())
    }

    pub fn on_select_board(&mut self, name: &str) -> Result<(), BoardError> {
        self.store.set_current_board(name)?;
        tracing::info!(board = name, "board selected");
        Ok(())
    }

    /// Add a sound to the current board. The file must load before the sound is
    /// stored.
    pub fn on_add_sound(&mut self, name: &str, path: &Path) -> Result<(), BoardError> {
        let board = self.store.current_board_name().to_string();
        self.store.check_new_sound(&board, name)?;
        check_supported(path)?;

        let record = SoundRecord::new(name.trim(), path);
        let key = SoundKey::of(&board, &record);
        self.playback.preload(&key, path)?;

        match self.store.add_sound(&board, record) {
            Err(e) if !e.state_changed() => {
                self.playback.forget(&key);
                Err(e)
            }
            result => result,
        }
    }

    /// Returns whether a sound was removed.
    pub fn on_delete_sound(&mut self, board: &str, sound: &str) -> Result<bool, BoardError> {
        if !self.store.contains(board) {
            return Err(BoardError::UnknownBoard(board.to_string()));
        }

        self.playback.forget(&SoundKey::new(board, sound));
        Ok(self.store.remove_sound(board, sound)?.is_some())
    }

    /// Replace a sound's name and file. The sound stops first, and the new file
    /// must load before the board changes.
    pub fn on_edit_sound(
        &mut self,
        board: &str,
        sound: &str,
        name: &str,
        path: &Path,
    ) -> Result<(), BoardError> {
        self.store.check_replacement(board, sound, name)?;
        check_supported(path)?;

        let old_key = SoundKey::new(board, sound);
        let record = SoundRecord::new(name.trim(), path);
        let new_key = SoundKey::of(board, &record);
        if new_key == old_key {
            // a new path reloads the clip on preload
            self.playback.stop(&old_key);
        } else {
            self.playback.forget(&old_key);
        }
        self.playback.preload(&new_key, path)?;

        self.store.replace_sound(board, sound, record).map(|_| ())
    }

    pub fn on_play(&mut self, key: &SoundKey) -> Result<(), BoardError> {
        let record = Self::lookup(&self.store, key)?;
        self.playback.play(&key.board, record)
    }

    /// Returns whether the sound now loops.
    pub fn on_toggle_loop(&mut self, key: &SoundKey) -> Result<bool, BoardError> {
        let record = Self::lookup(&self.store, key)?;
        self.playback.toggle_loop(&key.board, record)
    }

    pub fn on_stop(&mut self, key: &SoundKey) {
        self.playback.stop(key);
    }

    /// Pick up one-shots that finished on their own.
    pub fn poll(&mut self) -> Redraw {
        let finished = self.playback.reap();
        if finished.is_empty() {
            Redraw::Nothing
        } else {
            Redraw::Sounds
        }
    }

    pub fn shutdown(&mut self) {
        self.playback.stop_all();
        self.playback.backend_mut().poll();
    }

    fn lookup<'a>(store: &'a BoardStore, key: &SoundKey) -> Result<&'a SoundRecord, BoardError> {
        store
            .board(&key.board)
            .ok_or_else(|| BoardError::UnknownBoard(key.board.clone()))?
            .sound(&key.sound)
            .ok_or_else(|| BoardError::UnknownSound {
                board: key.board.clone(),
                sound: key.sound.clone(),
            })
    }
}

fn check_supported(path: &Path) -> Result<(), BoardError> {
    if soundy_decode::is_supported(path) {
        Ok(())
    } else {
        Err(BoardError::UnsupportedFile(path.to_path_buf()))
    }
}
