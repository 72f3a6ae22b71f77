//! The board collection and its persistence.
//!
//! `BoardStore` is the single writable source of truth for boards and sounds.
//! Every structural mutation is written to disk before the call returns.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use soundy_project::{BoardData, load_boards, save_boards};

use crate::board::Board;
use crate::error::BoardError;
use crate::sound::SoundRecord;

/// Always present, never deletable.
pub const DEFAULT_BOARD: &str = "Default Board";

#[derive(Debug)]
pub struct BoardStore {
    path: PathBuf,
    boards: IndexMap<String, Board>,
    /// Transient cursor; never written to the document.
    current: String,
}

impl BoardStore {
    /// A store holding only the empty default board. Nothing is written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut boards = IndexMap::new();
        boards.insert(DEFAULT_BOARD.to_string(), Board::new(DEFAULT_BOARD));
        Self {
            path: path.into(),
            boards,
            current: DEFAULT_BOARD.to_string(),
        }
    }

    /// Load the document at `path`, never failing.
    ///
    /// A missing document yields a fresh default store that is saved right away.
    /// An unreadable or malformed one yields a fresh default store in memory and
    /// the error; the bad file is left alone until the next mutation overwrites it.
    pub fn load(path: impl Into<PathBuf>) -> (Self, Option<BoardError>) {
        let path = path.into();
        match load_boards(&path) {
            Ok(document) => (Self::from_document(path, document), None),
            Err(e) if e.is_missing() => {
                tracing::info!(path = %path.display(), "no board document yet, creating one");
                let store = Self::new(path);
                let err = store.save().err();
                (store, err)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "could not read boards, starting fresh: {e}");
                (Self::new(path), Some(e.into()))
            }
        }
    }

    /// Build a store from a parsed document, dropping entries that would break
    /// the store's invariants.
    pub fn from_document(path: impl Into<PathBuf>, document: Vec<BoardData>) -> Self {
        let mut boards: IndexMap<String, Board> = IndexMap::new();

        for data in document {
            let name = data.board.trim().to_string();
            if name.is_empty() {
                tracing::warn!("skipping board with an empty name");
                continue;
            }
            if boards.contains_key(&name) {
                tracing::warn!(board = %name, "skipping duplicate board");
                continue;
            }

            let mut board = Board::new(name.clone());
            for sound in data.sounds {
                let record = normalized(SoundRecord::from(sound));
                if record.name().is_empty() {
                    tracing::warn!(board = %name, "skipping sound with an empty name");
                } else if board.contains(record.name()) {
                    tracing::warn!(board = %name, sound = record.name(), "skipping duplicate sound");
                } else {
                    board.push(record);
                }
            }
            boards.insert(name, board);
        }

        if !boards.contains_key(DEFAULT_BOARD) {
            if !boards.is_empty() {
                tracing::warn!("board document has no '{DEFAULT_BOARD}', restoring it");
            }
            boards.shift_insert(0, DEFAULT_BOARD.to_string(), Board::new(DEFAULT_BOARD));
        }

        Self {
            path: path.into(),
            boards,
            current: DEFAULT_BOARD.to_string(),
        }
    }

    pub fn to_document(&self) -> Vec<BoardData> {
        self.boards
            .values()
            .map(|board| BoardData {
                board: board.name().to_string(),
                sounds: board.sounds().iter().map(Into::into).collect(),
            })
            .collect()
    }

    /// Write every board to the document, replacing the previous version.
    pub fn save(&self) -> Result<(), BoardError> {
        save_boards(&self.path, &self.to_document())?;
        tracing::info!(path = %self.path.display(), boards = self.boards.len(), "boards saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.boards.values()
    }

    pub fn board_names(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }

    pub fn board(&self, name: &str) -> Option<&Board> {
        self.boards.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.boards.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn current_board_name(&self) -> &str {
        &self.current
    }

    pub fn current_board(&self) -> &Board {
        // `current` always names an existing board
        &self.boards[self.current.as_str()]
    }

    pub fn current_sounds(&self) -> &[SoundRecord] {
        self.current_board().sounds()
    }

    pub fn add_board(&mut self, name: &str) -> Result<(), BoardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::EmptyName);
        }
        if self.boards.contains_key(name) {
            return Err(BoardError::DuplicateBoard(name.to_string()));
        }

        self.boards.insert(name.to_string(), Board::new(name));
        tracing::info!(board = name, "board added");
        self.save()
    }

    /// Delete a board. If it was current, the first remaining board becomes current.
    pub fn remove_board(&mut self, name: &str) -> Result<Board, BoardError> {
        if name == DEFAULT_BOARD {
            return Err(BoardError::ProtectedBoard(name.to_string()));
        }
        let board = self
            .boards
            .shift_remove(name)
            .ok_or_else(|| BoardError::UnknownBoard(name.to_string()))?;

        if self.current == name {
            // the default board can't be removed, so one always remains
            if let Some(first) = self.boards.keys().next() {
                self.current = first.clone();
            }
        }
        tracing::info!(board = name, current = %self.current, "board removed");

        self.save()?;
        Ok(board)
    }

    pub fn set_current_board(&mut self, name: &str) -> Result<(), BoardError> {
        if !self.boards.contains_key(name) {
            return Err(BoardError::UnknownBoard(name.to_string()));
        }
        self.current = name.to_string();
        Ok(())
    }

    /// Check that `sound` could be added to `board` without changing anything.
    pub fn check_new_sound(&self, board: &str, sound: &str) -> Result<(), BoardError> {
        let target = self
            .boards
            .get(board)
            .ok_or_else(|| BoardError::UnknownBoard(board.to_string()))?;
        if sound.trim().is_empty() {
            return Err(BoardError::EmptyName);
        }
        if target.contains(sound.trim()) {
            return Err(BoardError::DuplicateSound {
                board: board.to_string(),
                sound: sound.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Append a sound to the end of `board`.
    pub fn add_sound(&mut self, board: &str, record: SoundRecord) -> Result<(), BoardError> {
        self.check_new_sound(board, record.name())?;
        let record = normalized(record);

        if let Some(target) = self.boards.get_mut(board) {
            tracing::info!(board, sound = record.name(), "sound added");
            target.push(record);
        }
        self.save()
    }

    /// Remove a sound by name. Absent sounds are a no-op and nothing is saved.
    pub fn remove_sound(
        &mut self,
        board: &str,
        sound: &str,
    ) -> Result<Option<SoundRecord>, BoardError> {
        let target = self
            .boards
            .get_mut(board)
            .ok_or_else(|| BoardError::UnknownBoard(board.to_string()))?;

        let Some(removed) = target.remove(sound) else {
            return Ok(None);
        };
        tracing::info!(board, sound, "sound removed");

        self.save()?;
        Ok(Some(removed))
    }

    /// Check that the sound `old_name` on `board` could be renamed to `new_name`.
    /// Returns its position.
    pub fn check_replacement(
        &self,
        board: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<usize, BoardError> {
        let target = self
            .boards
            .get(board)
            .ok_or_else(|| BoardError::UnknownBoard(board.to_string()))?;
        let idx = target.position(old_name).ok_or_else(|| BoardError::UnknownSound {
            board: board.to_string(),
            sound: old_name.to_string(),
        })?;

        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(BoardError::EmptyName);
        }
        if new_name != old_name && target.contains(new_name) {
            return Err(BoardError::DuplicateSound {
                board: board.to_string(),
                sound: new_name.to_string(),
            });
        }
        Ok(idx)
    }

    /// Replace the sound named `old_name` in place, keeping its position.
    pub fn replace_sound(
        &mut self,
        board: &str,
        old_name: &str,
        record: SoundRecord,
    ) -> Result<SoundRecord, BoardError> {
        let idx = self.check_replacement(board, old_name, record.name())?;
        let record = normalized(record);

        let Some(target) = self.boards.get_mut(board) else {
            return Err(BoardError::UnknownBoard(board.to_string()));
        };
        let old = target.replace_at(idx, record);
        tracing::info!(board, sound = old_name, "sound replaced");

        self.save()?;
        Ok(old)
    }
}

fn normalized(record: SoundRecord) -> SoundRecord {
    if record.name().trim() == record.name() {
        return record;
    }
    SoundRecord::new(record.name().trim(), record.path())
}
