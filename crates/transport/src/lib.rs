use std::path::Path;
use std::sync::Arc;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Decoded audio straight out of the decoder, interleaved.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Immutable, cheaply clonable clip audio.
///
/// The samples live in an `Arc<[f32]>` so the engine and any number of
/// handles can share one decoded clip without copying it.
#[derive(Clone)]
pub struct ClipAudio {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl ClipAudio {
    /// # Panics
    ///
    /// Panics if `channels` is 0 or if `samples.len()` is not divisible by `channels`.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        assert!(channels > 0, "channels must be greater than 0");
        assert_eq!(
            samples.len() % channels as usize,
            0,
            "samples.len() must be divisible by channels"
        );
        Self {
            samples: Arc::from(samples),
            sample_rate,
            channels,
        }
    }

    /// Takes ownership of a decoded buffer, dropping a trailing partial frame if any.
    pub fn from_audio_buffer(buffer: AudioBuffer) -> Self {
        let channels = buffer.channels.max(1);
        let mut samples = buffer.samples;
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self::new(samples, buffer.sample_rate, channels)
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_arc(&self) -> &Arc<[f32]> {
        &self.samples
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample of `channel` at `frame`, folding output channels onto the clip's channels.
    #[inline]
    pub fn sample_at(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.channels as usize;
        self.samples
            .get(frame * channels + channel % channels)
            .copied()
            .unwrap_or(0.0)
    }

    /// Resample to the output device rate. Same rate is a refcount bump.
    pub fn resample(&self, target_sample_rate: u32) -> anyhow::Result<Self> {
        if self.sample_rate == target_sample_rate {
            return Ok(self.clone());
        }
        resample_clip_audio(self, target_sample_rate)
    }
}

impl std::fmt::Debug for ClipAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipAudio")
            .field("frames", &self.frames())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Handle to a clip registered with an audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(pub u64);

/// Commands sent from the control thread to the audio callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the clip from its first frame, restarting it if already sounding.
    /// `generation` tags this run so its end can be told apart from earlier ones.
    Play { clip: ClipId, generation: u64 },
    /// Silence the clip and rewind it.
    Stop { clip: ClipId },
    SetRepeat { clip: ClipId, repeat: bool },
    /// Drop the clip's audio; the id is never reused.
    Unregister { clip: ClipId },
}

/// Notifications sent back from the audio callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A non-repeating clip ran off its last frame during the run started by
    /// the `Play` with the same generation.
    Finished { clip: ClipId, generation: u64 },
}

/// The playback capability the board logic drives.
///
/// Implemented by the real cpal engine and by in-memory fakes in tests.
pub trait AudioBackend {
    /// Decode `path` and make it playable. Fails if the file is missing or undecodable.
    fn load_clip(&mut self, path: &Path) -> anyhow::Result<ClipId>;

    fn play(&mut self, clip: ClipId);

    fn stop(&mut self, clip: ClipId);

    fn set_repeat(&mut self, clip: ClipId, repeat: bool);

    fn is_playing(&self, clip: ClipId) -> bool;

    /// Release the clip. Stops it first if it is sounding.
    fn unload(&mut self, clip: ClipId);

    /// Drain pending notifications from the audio thread.
    fn poll(&mut self) {}

    /// Most clips that can be loaded at once, if the backend has a limit.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Resample clip audio with sinc interpolation.
pub fn resample_clip_audio(audio: &ClipAudio, target_sample_rate: u32) -> anyhow::Result<ClipAudio> {
    if audio.sample_rate == target_sample_rate {
        return Ok(audio.clone());
    }

    let channels = audio.channels as usize;
    let input_frames = audio.frames();
    if input_frames == 0 {
        return Ok(ClipAudio::new(Vec::new(), target_sample_rate, audio.channels));
    }

    let resample_ratio = target_sample_rate as f64 / audio.sample_rate as f64;

    // rubato wants one Vec per channel
    let mut input_channels = vec![Vec::with_capacity(input_frames); channels];
    for frame in audio.samples().chunks_exact(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            input_channels[ch].push(*sample);
        }
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(resample_ratio, 2.0, params, input_frames, channels)?;
    let output_channels = resampler.process(&input_channels, None)?;

    let output_frames = output_channels.first().map_or(0, Vec::len);
    let mut output_samples = Vec::with_capacity(output_frames * channels);
    for frame_idx in 0..output_frames {
        for channel in &output_channels {
            output_samples.push(channel[frame_idx]);
        }
    }

    Ok(ClipAudio::new(
        output_samples,
        target_sample_rate,
        audio.channels,
    ))
}
