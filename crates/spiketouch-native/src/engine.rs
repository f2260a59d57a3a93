//! Haptic engine
//!
//! Couples the stimulus encoder to grain playback. Each tick:
//!
//! 1. follow press/release transitions in the pointer snapshot
//! 2. step the encoder with speed, average speed and material roughness
//! 3. play the channel's grain for every channel that fired
//!
//! Grains come from the shared [`GrainCache`], so switching material or
//! retuning the RA grain never renders inside the tick once prewarmed.

use std::collections::BTreeMap;
use std::sync::Arc;

use spiketouch_core::audio::{GrainSpec, MaterialProfile, MaterialShape, SoundBuffer};
use spiketouch_core::sns::{Channel, EncoderStep, StimulusEncoder, CHANNEL_COUNT};
use tracing::{debug, info};

use crate::cache::GrainCache;
use crate::config::{HapticConfig, SoundConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::player::{ChannelPlayer, Volume};
use crate::pointer::PointerSnapshot;

/// Encoder, active material, grains and player for one session.
pub struct HapticEngine {
    encoder: StimulusEncoder,
    sound: SoundConfig,
    materials: BTreeMap<String, MaterialProfile>,
    material_name: String,
    material: MaterialProfile,
    cache: Arc<GrainCache>,
    player: Arc<dyn ChannelPlayer>,
    grains: [Arc<SoundBuffer>; CHANNEL_COUNT],
    pressed: bool,
    spikes: [u64; CHANNEL_COUNT],
}

impl HapticEngine {
    /// Build an engine from a validated config, starting on its default
    /// material.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownMaterial`] if the default material is missing.
    pub fn new(
        config: &HapticConfig,
        cache: Arc<GrainCache>,
        player: Arc<dyn ChannelPlayer>,
    ) -> ConfigResult<Self> {
        let material = *config.material(&config.default_material)?;
        let pressure = cache.get_or_synthesize(&MaterialShape::Sine, config.sound.pressure.spec());
        let motion = cache.get_or_synthesize(&material.shape, config.sound.motion.spec_for(&material));
        let click = cache.get_or_synthesize(&material.shape, config.sound.click.spec_for(&material));

        Ok(Self {
            encoder: StimulusEncoder::with_config(config.encoder.clone()),
            sound: config.sound.clone(),
            materials: config.materials.clone(),
            material_name: config.default_material.clone(),
            material,
            cache,
            player,
            grains: [pressure, motion, click],
            pressed: false,
            spikes: [0; CHANNEL_COUNT],
        })
    }

    /// Run one tick against `snapshot`.
    pub fn tick(&mut self, snapshot: &PointerSnapshot) -> EncoderStep {
        if snapshot.pressed != self.pressed {
            if snapshot.pressed {
                self.press();
            } else {
                self.release();
            }
        }

        let step = self.encoder.step(
            snapshot.speed,
            snapshot.avg_speed,
            self.material.roughness,
            snapshot.pressed,
        );

        for channel in Channel::ALL {
            if step.fired(channel) {
                self.spikes[channel.index()] += 1;
                let volume = self.volume_for(channel, snapshot.speed);
                self.player
                    .play(&self.grains[channel.index()], channel as u8, volume);
            }
        }

        step
    }

    fn volume_for(&self, channel: Channel, speed: f64) -> Volume {
        match channel {
            Channel::Pressure => Volume::new(self.sound.pressure.volume),
            Channel::Motion => Volume::new(
                self.sound.motion.volume * self.sound.motion_volume.volume(speed),
            ),
            Channel::Click => Volume::new(self.sound.click.volume),
        }
    }

    /// Apply the press magnitude to the pressure channel
    pub fn press(&mut self) {
        self.pressed = true;
        self.encoder.press();
    }

    /// Drop the pressure channel input to 0
    pub fn release(&mut self) {
        self.pressed = false;
        self.encoder.release();
    }

    /// Switch to the named material. Unknown names leave the current
    /// material in place.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownMaterial`] if `name` is not in the table.
    pub fn select_material(&mut self, name: &str) -> ConfigResult<()> {
        let material = *self
            .materials
            .get(name)
            .ok_or_else(|| ConfigError::UnknownMaterial { name: name.to_string() })?;

        self.grains[Channel::Motion.index()] = self
            .cache
            .get_or_synthesize(&material.shape, self.sound.motion.spec_for(&material));
        self.grains[Channel::Click.index()] = self
            .cache
            .get_or_synthesize(&material.shape, self.sound.click.spec_for(&material));
        self.material = material;
        self.material_name = name.to_string();

        info!(material = name, family = %material.family(), "Material selected");
        Ok(())
    }

    /// Re-render the motion (RA) grain with explicit settings, keeping the
    /// active material's timbre.
    pub fn change_ra(&mut self, hz: f64, ms: f64, amp: f64, fade_out_ms: f64) {
        let spec = GrainSpec::new(hz, ms, amp, fade_out_ms);
        debug!(?spec, "RA grain changed");
        self.grains[Channel::Motion.index()] =
            self.cache.get_or_synthesize(&self.material.shape, spec);
    }

    /// Return the encoder to rest
    pub fn reset(&mut self) {
        self.encoder.reset();
        self.pressed = false;
    }

    /// Name of the active material
    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    /// Active material
    pub fn material(&self) -> &MaterialProfile {
        &self.material
    }

    /// Grain currently played for `channel`
    pub fn grain(&self, channel: Channel) -> &Arc<SoundBuffer> {
        &self.grains[channel.index()]
    }

    /// Spikes per channel since construction
    pub fn spike_counts(&self) -> [u64; CHANNEL_COUNT] {
        self.spikes
    }

    /// The encoder
    pub fn encoder(&self) -> &StimulusEncoder {
        &self.encoder
    }

    /// Tick period implied by the encoder step (ms)
    pub fn dt_ms(&self) -> f64 {
        self.encoder.config().dt_ms
    }
}

impl std::fmt::Debug for HapticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticEngine")
            .field("material", &self.material_name)
            .field("pressed", &self.pressed)
            .field("spikes", &self.spikes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::RecordingPlayer;

    fn engine() -> (HapticEngine, Arc<RecordingPlayer>) {
        let player = Arc::new(RecordingPlayer::new());
        let engine = HapticEngine::new(
            &HapticConfig::default(),
            Arc::new(GrainCache::default()),
            player.clone(),
        )
        .unwrap();
        (engine, player)
    }

    fn held(speed: f64) -> PointerSnapshot {
        PointerSnapshot {
            speed,
            avg_speed: speed,
            pressed: true,
        }
    }

    #[test]
    fn test_press_plays_click() {
        let (mut engine, player) = engine();
        for _ in 0..5 {
            engine.tick(&held(0.0));
        }
        assert!(player.count(Channel::Click as u8) >= 1);
        assert_eq!(player.count(Channel::Motion as u8), 0);
    }

    #[test]
    fn test_drag_plays_motion_with_ramped_volume() {
        let (mut engine, player) = engine();
        engine.select_material("rough").unwrap();
        for _ in 0..300 {
            engine.tick(&held(2500.0));
        }
        let motion: Vec<_> = player
            .records()
            .into_iter()
            .filter(|r| r.channel_id == Channel::Motion as u8)
            .collect();
        assert!(!motion.is_empty());
        let expected = HapticConfig::default().sound.motion_volume.volume(2500.0);
        assert!(motion.iter().all(|r| (r.volume - expected).abs() < 1e-6));
        assert_eq!(engine.spike_counts()[1], motion.len() as u64);
    }

    #[test]
    fn test_unknown_material_keeps_current() {
        let (mut engine, _) = engine();
        let before = Arc::clone(engine.grain(Channel::Click));
        assert!(engine.select_material("velvet").is_err());
        assert_eq!(engine.material_name(), "glass");
        assert!(Arc::ptr_eq(&before, engine.grain(Channel::Click)));
    }

    #[test]
    fn test_select_material_swaps_grains() {
        let (mut engine, _) = engine();
        engine.select_material("wood").unwrap();
        // 35 Hz * 0.9 -> 31 Hz over 90 ms
        assert_eq!(engine.grain(Channel::Motion).len(), 3969);
        assert_eq!(engine.material().roughness, 0.8);
    }

    #[test]
    fn test_change_ra() {
        let (mut engine, _) = engine();
        engine.change_ra(80.0, 40.0, 0.5, 5.0);
        assert_eq!(engine.grain(Channel::Motion).len(), 1764);
    }

    #[test]
    fn test_untouched_pad_is_silent() {
        let (mut engine, player) = engine();
        for _ in 0..1000 {
            engine.tick(&PointerSnapshot::default());
        }
        assert!(player.is_empty(), "{:?}", player.records());
        assert_eq!(engine.spike_counts(), [0, 0, 0]);
    }

    #[test]
    fn test_release_edge_clicks() {
        let (mut engine, player) = engine();
        for _ in 0..100 {
            engine.tick(&held(0.0));
        }
        let clicks = player.count(Channel::Click as u8);
        for _ in 0..5 {
            engine.tick(&PointerSnapshot::default());
        }
        assert!(player.count(Channel::Click as u8) > clicks);
    }
}
