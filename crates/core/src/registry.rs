use std::collections::HashMap;
use std::path::{Path, PathBuf};

use soundy_transport::{AudioBackend, ClipId};

use crate::error::BoardError;
use crate::sound::{SoundKey, SoundRecord};

/// Playback flags for one sound. A sound with no entry is idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_looping: bool,
}

impl PlaybackState {
    const ONE_SHOT: Self = Self {
        is_playing: true,
        is_looping: false,
    };

    const LOOPING: Self = Self {
        is_playing: true,
        is_looping: true,
    };
}

#[derive(Debug)]
struct LoadedClip {
    clip: ClipId,
    path: PathBuf,
    last_used: u64,
}

/// Which sounds are audible, keyed by board and sound name rather than by clip
/// handle, so a reloaded clip never leaves a stale loop behind.
pub struct PlaybackRegistry<B: AudioBackend> {
    backend: B,
    clips: HashMap<SoundKey, LoadedClip>,
    active: HashMap<SoundKey, PlaybackState>,
    uses: u64,
}

impl<B: AudioBackend> PlaybackRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clips: HashMap::new(),
            active: HashMap::new(),
            uses: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Play `record` once from the start. A loop on the same sound is cancelled
    /// first so loop and one-shot never overlap.
    pub fn play(&mut self, board: &str, record: &SoundRecord) -> Result<(), BoardError> {
        let key = SoundKey::of(board, record);
        if self.is_looping(&key) {
            self.stop(&key);
        }

        let clip = self.clip_for(&key, record.path())?;
        self.backend.set_repeat(clip, false);
        self.backend.play(clip);
        tracing::debug!(sound = %key, "play");

        self.active.insert(key, PlaybackState::ONE_SHOT);
        Ok(())
    }

    /// Flip between idle and looping. Returns whether the sound now loops.
    pub fn toggle_loop(&mut self, board: &str, record: &SoundRecord) -> Result<bool, BoardError> {
        let key = SoundKey::of(board, record);
        if self.is_looping(&key) {
            self.stop(&key);
            return Ok(false);
        }

        let clip = self.clip_for(&key, record.path())?;
        self.backend.set_repeat(clip, true);
        self.backend.play(clip);
        tracing::debug!(sound = %key, "loop");

        self.active.insert(key, PlaybackState::LOOPING);
        Ok(true)
    }

    /// Silence a sound and clear its flags. No-op for idle sounds.
    pub fn stop(&mut self, key: &SoundKey) {
        let was_active = self.active.remove(key).is_some();
        if let Some(loaded) = self.clips.get(key) {
            self.backend.stop(loaded.clip);
            self.backend.set_repeat(loaded.clip, false);
        }
        if was_active {
            tracing::debug!(sound = %key, "stop");
        }
    }

    pub fn is_playing(&self, key: &SoundKey) -> bool {
        self.state(key).is_playing
    }

    pub fn is_looping(&self, key: &SoundKey) -> bool {
        self.state(key).is_looping
    }

    pub fn state(&self, key: &SoundKey) -> PlaybackState {
        self.active.get(key).copied().unwrap_or_default()
    }

    pub fn active(&self) -> impl Iterator<Item = (&SoundKey, &PlaybackState)> {
        self.active.iter()
    }

    pub fn is_loaded(&self, key: &SoundKey) -> bool {
        self.clips.contains_key(key)
    }

    /// Load the clip for `key` without playing it.
    pub fn preload(&mut self, key: &SoundKey, path: &Path) -> Result<(), BoardError> {
        self.clip_for(key, path).map(|_| ())
    }

    /// Stop and unload a sound's clip.
    pub fn forget(&mut self, key: &SoundKey) {
        self.stop(key);
        if let Some(loaded) = self.clips.remove(key) {
            self.backend.unload(loaded.clip);
            tracing::debug!(sound = %key, "clip unloaded");
        }
    }

    /// Forget every sound that belongs to `board`.
    pub fn forget_board(&mut self, board: &str) {
        let mut keys: Vec<SoundKey> = self
            .clips
            .keys()
            .chain(self.active.keys())
            .filter(|key| key.board == board)
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();

        for key in &keys {
            self.forget(key);
        }
    }

    pub fn stop_all(&mut self) {
        let keys: Vec<SoundKey> = self.active.keys().cloned().collect();
        for key in &keys {
            self.stop(key);
        }
    }

    /// Drop entries for one-shots that ran off their end. Returns the sounds that
    /// went idle.
    pub fn reap(&mut self) -> Vec<SoundKey> {
        self.backend.poll();

        let mut finished = Vec::new();
        self.active.retain(|key, state| {
            let sounding = state.is_looping
                || self
                    .clips
                    .get(key)
                    .is_some_and(|loaded| self.backend.is_playing(loaded.clip));
            if !sounding {
                finished.push(key.clone());
            }
            sounding
        });
        finished
    }

    /// The clip for `key`, loading it on first use and reloading it when the
    /// record now points somewhere else.
    fn clip_for(&mut self, key: &SoundKey, path: &Path) -> Result<ClipId, BoardError> {
        self.uses += 1;
        let now = self.uses;
        if let Some(loaded) = self.clips.get_mut(key) {
            if loaded.path == path {
                loaded.last_used = now;
                return Ok(loaded.clip);
            }
            tracing::debug!(sound = %key, "path changed, reloading clip");
            self.forget(key);
        }

        if let Some(capacity) = self.backend.capacity() {
            while self.clips.len() >= capacity && self.evict_idle() {}
        }

        let clip = self.backend.load_clip(path).map_err(|source| {
            tracing::warn!(sound = %key, path = %path.display(), "clip failed to load: {source:#}");
            BoardError::Playback {
                sound: key.clone(),
                source,
            }
        })?;
        self.clips.insert(
            key.clone(),
            LoadedClip {
                clip,
                path: path.to_path_buf(),
                last_used: now,
            },
        );
        Ok(clip)
    }

    /// Unload the least recently used clip that is not sounding. Returns false
    /// when every loaded clip is in use.
    fn evict_idle(&mut self) -> bool {
        let oldest = self
            .clips
            .iter()
            .filter(|(key, _)| !self.active.contains_key(*key))
            .min_by_key(|(_, loaded)| loaded.last_used)
            .map(|(key, _)| key.clone());

        let Some(key) = oldest else {
            return false;
        };
        tracing::debug!(sound = %key, "evicting idle clip");
        self.forget(&key);
        true
    }
}
