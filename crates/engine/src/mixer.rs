//! The part of the engine that runs inside the audio callback.
//!
//! Nothing here allocates after construction or blocks: voices live in a
//! pre-sized `Vec`, and dropped clip audio is handed to the basedrop collector.

use basedrop::Shared;
use soundy_transport::{ClipAudio, ClipId, Command};

pub(crate) type SharedClip = Shared<ClipAudio>;

/// Hard cap on registered clips so the voice list never reallocates in the callback.
pub const MAX_CLIPS: usize = 256;

/// Widest output layout the mixer renders; extra device channels stay silent.
pub const MAX_OUTPUT_CHANNELS: usize = 8;

/// Messages from the control thread. Registration shares the command queue so a
/// `Play` can never overtake the `Register` of the clip it refers to.
pub(crate) enum EngineMessage {
    Register { clip: ClipId, audio: SharedClip },
    Command(Command),
}

struct Voice {
    clip: ClipId,
    audio: SharedClip,
    position: usize,
    playing: bool,
    repeat: bool,
    generation: u64,
}

pub(crate) struct Mixer {
    voices: Vec<Voice>,
    output_channels: usize,
}

impl Mixer {
    pub fn new(output_channels: usize) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_CLIPS),
            output_channels: output_channels.clamp(1, MAX_OUTPUT_CHANNELS),
        }
    }

    pub fn handle(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Register { clip, audio } => {
                if self.voices.len() < MAX_CLIPS {
                    self.voices.push(Voice {
                        clip,
                        audio,
                        position: 0,
                        playing: false,
                        repeat: false,
                        generation: 0,
                    });
                }
            }
            EngineMessage::Command(Command::Play { clip, generation }) => {
                if let Some(voice) = self.voice_mut(clip) {
                    voice.position = 0;
                    voice.playing = true;
                    voice.generation = generation;
                }
            }
            EngineMessage::Command(Command::Stop { clip }) => {
                if let Some(voice) = self.voice_mut(clip) {
                    voice.position = 0;
                    voice.playing = false;
                }
            }
            EngineMessage::Command(Command::SetRepeat { clip, repeat }) => {
                if let Some(voice) = self.voice_mut(clip) {
                    voice.repeat = repeat;
                }
            }
            EngineMessage::Command(Command::Unregister { clip }) => {
                if let Some(idx) = self.voices.iter().position(|v| v.clip == clip) {
                    self.voices.swap_remove(idx);
                }
            }
        }
    }

    fn voice_mut(&mut self, clip: ClipId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.clip == clip)
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Mix one output frame into `out` (overwritten, not accumulated).
    ///
    /// `finished` is called with the clip and the generation of its run for every
    /// non-repeating clip that ran off its end.
    pub fn mix_frame(&mut self, out: &mut [f32], mut finished: impl FnMut(ClipId, u64)) {
        out.fill(0.0);

        for voice in self.voices.iter_mut().filter(|v| v.playing) {
            let frames = voice.audio.frames();
            if voice.position >= frames {
                if voice.repeat && frames > 0 {
                    voice.position = 0;
                } else {
                    voice.playing = false;
                    voice.position = 0;
                    finished(voice.clip, voice.generation);
                    continue;
                }
            }

            for (ch, sample) in out.iter_mut().enumerate() {
                *sample += voice.audio.sample_at(voice.position, ch);
            }
            voice.position += 1;
        }
    }

    #[cfg(test)]
    fn is_playing(&self, clip: ClipId) -> bool {
        self.voices.iter().any(|v| v.clip == clip && v.playing)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basedrop::Collector;

    fn register(mixer: &mut Mixer, collector: &Collector, id: u64, samples: Vec<f32>) -> ClipId {
        let clip = ClipId(id);
        let audio = Shared::new(&collector.handle(), ClipAudio::new(samples, 48000, 1));
        mixer.handle(EngineMessage::Register { clip, audio });
        clip
    }

    fn render(mixer: &mut Mixer, frames: usize) -> (Vec<f32>, Vec<ClipId>) {
        let mut out = Vec::new();
        let mut done = Vec::new();
        let mut frame = [0.0f32; 2];
        for _ in 0..frames {
            mixer.mix_frame(&mut frame, |clip, _| done.push(clip));
            out.push(frame[0]);
        }
        (out, done)
    }

    #[test]
    fn test_registered_clip_is_silent_until_played() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(2);
        register(&mut mixer, &collector, 1, vec![0.5, 0.5]);

        let (out, done) = render(&mut mixer, 2);

        assert_eq!(out, vec![0.0, 0.0]);
        assert!(done.is_empty());
    }

    #[test]
    fn test_one_shot_plays_once_and_reports_finished() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(2);
        let clip = register(&mut mixer, &collector, 1, vec![0.1, 0.2, 0.3]);

        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        let (out, done) = render(&mut mixer, 5);

        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.0, 0.0]);
        assert_eq!(done, vec![clip]);
        assert!(!mixer.is_playing(clip));
    }

    #[test]
    fn test_finished_reports_generation_of_latest_play() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(1);
        let clip = register(&mut mixer, &collector, 1, vec![0.1, 0.2]);

        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        render(&mut mixer, 1);
        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 2 }));

        let mut done = Vec::new();
        let mut frame = [0.0f32; 1];
        for _ in 0..3 {
            mixer.mix_frame(&mut frame, |clip, generation| done.push((clip, generation)));
        }

        assert_eq!(done, vec![(clip, 2)]);
    }

    #[test]
    fn test_repeat_wraps_without_finishing() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(2);
        let clip = register(&mut mixer, &collector, 1, vec![0.1, 0.2]);

        mixer.handle(EngineMessage::Command(Command::SetRepeat { clip, repeat: true }));
        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        let (out, done) = render(&mut mixer, 5);

        assert_eq!(out, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
        assert!(done.is_empty());
        assert!(mixer.is_playing(clip));
    }

    #[test]
    fn test_stop_silences_and_rewinds() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(2);
        let clip = register(&mut mixer, &collector, 1, vec![0.1, 0.2, 0.3]);

        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        render(&mut mixer, 1);
        mixer.handle(EngineMessage::Command(Command::Stop { clip }));
        let (out, done) = render(&mut mixer, 2);
        assert_eq!(out, vec![0.0, 0.0]);
        assert!(done.is_empty());

        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        let (out, _) = render(&mut mixer, 1);
        assert_eq!(out, vec![0.1]);
    }

    #[test]
    fn test_play_restarts_a_sounding_clip() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(1);
        let clip = register(&mut mixer, &collector, 1, vec![0.1, 0.2, 0.3]);

        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        render(&mut mixer, 2);
        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        let (out, _) = render(&mut mixer, 1);

        assert_eq!(out, vec![0.1]);
    }

    #[test]
    fn test_clips_mix_independently() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(2);
        let a = register(&mut mixer, &collector, 1, vec![0.25, 0.25, 0.25]);
        let b = register(&mut mixer, &collector, 2, vec![0.5]);

        mixer.handle(EngineMessage::Command(Command::Play { clip: a, generation: 1 }));
        mixer.handle(EngineMessage::Command(Command::Play { clip: b, generation: 1 }));
        let (out, done) = render(&mut mixer, 3);

        assert_eq!(out, vec![0.75, 0.25, 0.25]);
        assert_eq!(done, vec![b]);
        assert!(mixer.is_playing(a));
    }

    #[test]
    fn test_unregister_drops_voice() {
        let mut collector = Collector::new();
        let mut mixer = Mixer::new(2);
        let clip = register(&mut mixer, &collector, 7, vec![0.1]);

        mixer.handle(EngineMessage::Command(Command::Unregister { clip }));
        collector.collect();

        assert_eq!(mixer.len(), 0);
        // commands for an unknown clip are ignored
        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        let (out, _) = render(&mut mixer, 1);
        assert_eq!(out, vec![0.0]);
    }

    #[test]
    fn test_mono_clip_fills_every_output_channel() {
        let collector = Collector::new();
        let mut mixer = Mixer::new(2);
        let clip = register(&mut mixer, &collector, 1, vec![0.4]);

        mixer.handle(EngineMessage::Command(Command::Play { clip, generation: 1 }));
        let mut frame = [0.0f32; 2];
        mixer.mix_frame(&mut frame, |_, _| {});

        assert_eq!(frame, [0.4, 0.4]);
    }
}
