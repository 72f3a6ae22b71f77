//! In-memory backend that records every command it receives.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use soundy_transport::{AudioBackend, ClipId, Command};

#[derive(Debug, Default)]
pub struct FakeBackend {
    next_id: u64,
    last_generation: u64,
    capacity: Option<usize>,
    clips: HashMap<ClipId, PathBuf>,
    /// Sounding clips and the generation of their run.
    playing: HashMap<ClipId, u64>,
    repeating: HashSet<ClipId>,
    finished: Vec<(ClipId, u64)>,
    pub commands: Vec<Command>,
    pub loads: usize,
}

impl FakeBackend {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn clip_for_path(&self, path: impl AsRef<Path>) -> Option<ClipId> {
        self.clips
            .iter()
            .find(|(_, p)| p.as_path() == path.as_ref())
            .map(|(id, _)| *id)
    }

    pub fn is_loaded(&self, clip: ClipId) -> bool {
        self.clips.contains_key(&clip)
    }

    pub fn is_repeating(&self, clip: ClipId) -> bool {
        self.repeating.contains(&clip)
    }

    pub fn loaded_count(&self) -> usize {
        self.clips.len()
    }

    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }

    /// Let every non-repeating clip reach its end. The callback has stopped them,
    /// but the handle only learns of it on the next `poll`.
    pub fn finish_one_shots(&mut self) {
        self.finished = self
            .playing
            .iter()
            .filter(|(clip, _)| !self.repeating.contains(*clip))
            .map(|(clip, generation)| (*clip, *generation))
            .collect();
    }
}

impl AudioBackend for FakeBackend {
    fn load_clip(&mut self, path: &Path) -> anyhow::Result<ClipId> {
        if path.to_string_lossy().contains("broken") {
            anyhow::bail!("cannot decode {}", path.display());
        }
        if self.capacity.is_some_and(|cap| self.clips.len() >= cap) {
            anyhow::bail!("too many loaded sounds");
        }
        self.next_id += 1;
        self.loads += 1;
        let clip = ClipId(self.next_id);
        self.clips.insert(clip, path.to_path_buf());
        Ok(clip)
    }

    fn play(&mut self, clip: ClipId) {
        self.last_generation += 1;
        let generation = self.last_generation;
        self.commands.push(Command::Play { clip, generation });
        self.playing.insert(clip, generation);
    }

    fn stop(&mut self, clip: ClipId) {
        self.commands.push(Command::Stop { clip });
        self.playing.remove(&clip);
    }

    fn set_repeat(&mut self, clip: ClipId, repeat: bool) {
        self.commands.push(Command::SetRepeat { clip, repeat });
        if repeat {
            self.repeating.insert(clip);
        } else {
            self.repeating.remove(&clip);
        }
    }

    fn is_playing(&self, clip: ClipId) -> bool {
        self.playing.contains_key(&clip)
    }

    fn unload(&mut self, clip: ClipId) {
        self.commands.push(Command::Unregister { clip });
        self.playing.remove(&clip);
        self.repeating.remove(&clip);
        self.clips.remove(&clip);
    }

    fn poll(&mut self) {
        for (clip, generation) in self.finished.drain(..) {
            if self.playing.get(&clip) == Some(&generation) {
                self.playing.remove(&clip);
            }
        }
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
