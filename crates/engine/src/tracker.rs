//! Control-side record of which clips are sounding.

use std::collections::HashMap;

use soundy_transport::ClipId;

/// Maps each sounding clip to the generation of its current run.
#[derive(Debug, Default)]
pub(crate) struct PlaybackTracker {
    playing: HashMap<ClipId, u64>,
    last_generation: u64,
}

impl PlaybackTracker {
    /// Allocate the tag for a new `Play`.
    pub fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    pub fn started(&mut self, clip: ClipId, generation: u64) {
        self.playing.insert(clip, generation);
    }

    pub fn stopped(&mut self, clip: ClipId) {
        self.playing.remove(&clip);
    }

    /// Apply a `Finished` notice. Notices from runs that were since restarted are ignored.
    pub fn finished(&mut self, clip: ClipId, generation: u64) -> bool {
        if self.playing.get(&clip) == Some(&generation) {
            self.playing.remove(&clip);
            return true;
        }
        false
    }

    pub fn is_playing(&self, clip: ClipId) -> bool {
        self.playing.contains_key(&clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_of_current_run_stops() {
        let mut tracker = PlaybackTracker::default();
        let clip = ClipId(1);
        let generation = tracker.next_generation();
        tracker.started(clip, generation);

        assert!(tracker.finished(clip, generation));
        assert!(!tracker.is_playing(clip));
    }

    #[test]
    fn test_stale_finish_after_restart_is_ignored() {
        let mut tracker = PlaybackTracker::default();
        let clip = ClipId(1);
        let first = tracker.next_generation();
        tracker.started(clip, first);
        // restarted before the first run's end was drained
        let second = tracker.next_generation();
        tracker.started(clip, second);

        assert!(!tracker.finished(clip, first));
        assert!(tracker.is_playing(clip));
        assert!(tracker.finished(clip, second));
    }

    #[test]
    fn test_finish_after_stop_is_ignored() {
        let mut tracker = PlaybackTracker::default();
        let clip = ClipId(3);
        let generation = tracker.next_generation();
        tracker.started(clip, generation);
        tracker.stopped(clip);

        assert!(!tracker.finished(clip, generation));
        assert!(!tracker.is_playing(clip));
    }
}
