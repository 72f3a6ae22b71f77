use crate::sound::SoundRecord;

/// A named, ordered collection of sounds. Order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    name: String,
    sounds: Vec<SoundRecord>,
}

impl Board {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sounds: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sounds(&self) -> &[SoundRecord] {
        &self.sounds
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn sound(&self, name: &str) -> Option<&SoundRecord> {
        self.sounds.iter().find(|s| s.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sounds.iter().position(|s| s.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub(crate) fn push(&mut self, record: SoundRecord) {
        self.sounds.push(record);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<SoundRecord> {
        let idx = self.position(name)?;
        Some(self.sounds.remove(idx))
    }

    /// Swap the record at `idx`, returning the old one.
    pub(crate) fn replace_at(&mut self, idx: usize, record: SoundRecord) -> SoundRecord {
        std::mem::replace(&mut self.sounds[idx], record)
    }
}
