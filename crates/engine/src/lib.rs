mod mixer;
mod tracker;

use std::path::Path;

use basedrop::{Collector, Handle, Shared};
use cpal::{
    FromSample, SizedSample,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use soundy_transport::{AudioBackend, ClipAudio, ClipId, Command, Status};

use mixer::{EngineMessage, MAX_OUTPUT_CHANNELS, Mixer};
use tracker::PlaybackTracker;

pub use mixer::MAX_CLIPS;

const COMMAND_QUEUE: usize = 1024;
const STATUS_QUEUE: usize = 256;

/// Control-side handle to the running output stream.
///
/// Dropping it stops the stream.
pub struct AudioEngineHandle {
    messages: rtrb::Producer<EngineMessage>,
    status: rtrb::Consumer<Status>,
    collector: Collector,
    handle: Handle,
    sample_rate: u32,
    next_clip_id: u64,
    /// Clips the callback holds, counting ones whose `Unregister` is still pending.
    registered: usize,
    /// Unloads that found the queue full; retried on `poll`.
    pending_unloads: Vec<ClipId>,
    tracker: PlaybackTracker,
    _stream: cpal::Stream,
}

pub fn start() -> anyhow::Result<AudioEngineHandle> {
    let collector = Collector::new();
    let handle = collector.handle();

    let (message_tx, message_rx) = rtrb::RingBuffer::<EngineMessage>::new(COMMAND_QUEUE);
    let (status_tx, status_rx) = rtrb::RingBuffer::<Status>::new(STATUS_QUEUE);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("no output device found"))?;

    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0;

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(&device, &config.into(), message_rx, status_tx)?
        }
        sample_format => anyhow::bail!("unsupported sample format '{sample_format}'"),
    };

    stream.play()?;

    tracing::info!(
        device = %device.name().unwrap_or_default(),
        sample_rate,
        "audio output started"
    );

    Ok(AudioEngineHandle {
        messages: message_tx,
        status: status_rx,
        collector,
        handle,
        sample_rate,
        next_clip_id: 0,
        registered: 0,
        pending_unloads: Vec::new(),
        tracker: PlaybackTracker::default(),
        _stream: stream,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut message_rx: rtrb::Consumer<EngineMessage>,
    mut status_tx: rtrb::Producer<Status>,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let output_channels = config.channels as usize;
    let mut mixer = Mixer::new(output_channels);
    let mixed_channels = mixer.output_channels();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(message) = message_rx.pop() {
                mixer.handle(message);
            }

            let mut mixed = [0.0f32; MAX_OUTPUT_CHANNELS];
            for frame in data.chunks_mut(output_channels) {
                mixer.mix_frame(&mut mixed[..mixed_channels], |clip, generation| {
                    let _ = status_tx.push(Status::Finished { clip, generation });
                });
                for (ch, sample) in frame.iter_mut().enumerate() {
                    let value = mixed.get(ch).copied().unwrap_or(0.0);
                    *sample = T::from_sample(value);
                }
            }
        },
        |err| tracing::error!("audio stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

impl AudioEngineHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn send(&mut self, command: Command) -> bool {
        if self.messages.push(EngineMessage::Command(command)).is_err() {
            tracing::warn!(?command, "audio command queue full, dropping command");
            return false;
        }
        true
    }

    fn flush_unloads(&mut self) {
        let mut pending = std::mem::take(&mut self.pending_unloads);
        pending.retain(|&clip| !self.try_unregister(clip));
        self.pending_unloads = pending;
    }

    fn try_unregister(&mut self, clip: ClipId) -> bool {
        if self
            .messages
            .push(EngineMessage::Command(Command::Unregister { clip }))
            .is_err()
        {
            return false;
        }
        self.registered = self.registered.saturating_sub(1);
        true
    }
}

impl AudioBackend for AudioEngineHandle {
    fn load_clip(&mut self, path: &Path) -> anyhow::Result<ClipId> {
        self.flush_unloads();
        if self.registered >= MAX_CLIPS {
            anyhow::bail!("too many loaded sounds (limit {MAX_CLIPS})");
        }

        let buffer = soundy_decode::decode_file(path)?;
        let audio = ClipAudio::from_audio_buffer(buffer).resample(self.sample_rate)?;
        tracing::debug!(path = %path.display(), ?audio, "decoded clip");

        let clip = ClipId(self.next_clip_id);
        let audio = Shared::new(&self.handle, audio);
        if self
            .messages
            .push(EngineMessage::Register { clip, audio })
            .is_err()
        {
            anyhow::bail!("audio command queue full");
        }

        self.next_clip_id += 1;
        self.registered += 1;
        Ok(clip)
    }

    fn play(&mut self, clip: ClipId) {
        let generation = self.tracker.next_generation();
        if self.send(Command::Play { clip, generation }) {
            self.tracker.started(clip, generation);
        }
    }

    fn stop(&mut self, clip: ClipId) {
        self.send(Command::Stop { clip });
        self.tracker.stopped(clip);
    }

    fn set_repeat(&mut self, clip: ClipId, repeat: bool) {
        self.send(Command::SetRepeat { clip, repeat });
    }

    fn is_playing(&self, clip: ClipId) -> bool {
        self.tracker.is_playing(clip)
    }

    fn unload(&mut self, clip: ClipId) {
        self.tracker.stopped(clip);
        if !self.try_unregister(clip) {
            tracing::warn!(?clip, "audio command queue full, unload deferred");
            self.pending_unloads.push(clip);
        }
    }

    fn poll(&mut self) {
        while let Ok(status) = self.status.pop() {
            match status {
                Status::Finished { clip, generation } => {
                    self.tracker.finished(clip, generation);
                }
            }
        }

        self.flush_unloads();
        self.collector.collect();
    }

    fn capacity(&self) -> Option<usize> {
        Some(MAX_CLIPS)
    }
}
