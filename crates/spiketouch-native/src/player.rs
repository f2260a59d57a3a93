//! Channel player seam
//!
//! Audio output is outside this crate. Anything that can start a PCM buffer
//! on a numbered channel implements [`ChannelPlayer`]; the engine and the
//! remote renderer only ever talk to that trait.

use std::sync::Arc;

use parking_lot::Mutex;
use spiketouch_core::audio::SoundBuffer;
use tracing::{debug, info};

/// Playback level in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Volume(f32);

impl Volume {
    /// Full level
    pub const MAX: Self = Self(1.0);

    /// Clamp `value` into `[0, 1]`; NaN becomes silence.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            debug!(value, "Volume is NaN, muting");
            return Self(0.0);
        }
        let clamped = value.clamp(0.0, 1.0);
        if clamped != value {
            debug!(value, clamped, "Volume out of range, clamping");
        }
        Self(clamped)
    }

    /// Level as `f32`
    pub fn get(self) -> f32 {
        self.0
    }
}

impl From<f32> for Volume {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// Sink for rendered grains.
pub trait ChannelPlayer: Send + Sync {
    /// Start `buffer` on `channel_id`, replacing whatever that channel plays.
    fn play(&self, buffer: &SoundBuffer, channel_id: u8, volume: Volume);
}

impl<P: ChannelPlayer + ?Sized> ChannelPlayer for Arc<P> {
    fn play(&self, buffer: &SoundBuffer, channel_id: u8, volume: Volume) {
        (**self).play(buffer, channel_id, volume);
    }
}

/// Player that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPlayer;

impl ChannelPlayer for TracingPlayer {
    fn play(&self, buffer: &SoundBuffer, channel_id: u8, volume: Volume) {
        info!(
            channel_id,
            samples = buffer.len(),
            duration_ms = buffer.duration_ms(),
            volume = volume.get(),
            "Play grain"
        );
    }
}

/// One call to [`RecordingPlayer::play`](ChannelPlayer::play)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayRecord {
    /// Channel played on
    pub channel_id: u8,
    /// Sample count of the buffer
    pub samples: usize,
    /// Peak absolute sample
    pub peak: u16,
    /// Clamped volume
    pub volume: f32,
}

/// Player that keeps every play for later inspection.
#[derive(Debug, Default)]
pub struct RecordingPlayer {
    records: Mutex<Vec<PlayRecord>>,
}

impl RecordingPlayer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records so far
    pub fn records(&self) -> Vec<PlayRecord> {
        self.records.lock().clone()
    }

    /// Number of plays on `channel_id`
    pub fn count(&self, channel_id: u8) -> usize {
        self.records.lock().iter().filter(|r| r.channel_id == channel_id).count()
    }

    /// Total plays
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing has played
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ChannelPlayer for RecordingPlayer {
    fn play(&self, buffer: &SoundBuffer, channel_id: u8, volume: Volume) {
        self.records.lock().push(PlayRecord {
            channel_id,
            samples: buffer.len(),
            peak: buffer.peak(),
            volume: volume.get(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_clamps() {
        assert_eq!(Volume::new(1.8).get(), 1.0);
        assert_eq!(Volume::new(-0.5).get(), 0.0);
        assert_eq!(Volume::new(f32::NAN).get(), 0.0);
        assert_eq!(Volume::from(0.7).get(), 0.7);
    }

    #[test]
    fn test_recording_player() {
        let player = Arc::new(RecordingPlayer::new());
        let buffer = SoundBuffer::from_samples(vec![0, 100, -200], 44_100);

        let shared: Arc<dyn ChannelPlayer> = player.clone();
        shared.play(&buffer, 1, Volume::new(2.0));
        shared.play(&buffer, 2, Volume::MAX);

        assert_eq!(player.len(), 2);
        assert_eq!(player.count(1), 1);
        let first = player.records()[0];
        assert_eq!(first.samples, 3);
        assert_eq!(first.peak, 200);
        assert_eq!(first.volume, 1.0);
    }
}
