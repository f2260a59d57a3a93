//! Stimulus Encoder
//!
//! Translates pointer state into input currents for the three-channel
//! receptor bank and keeps the cross-tick state that translation needs.
//!
//! # Per-tick pipeline
//!
//! ```text
//! pressure_input ─────────────────────────────────────────┐
//!        │ delta vs. previous tick                        │
//!        ▼                                                ▼
//! edge? ── arm burst (magnitude, ticks, d_burst) ──► click current ──► clip ─┐
//!                                                                           ▼
//! speed, roughness, pressed ──► motion current ──► clip ──────────────► NeuronBank
//!                                                                           │
//!                      pressure fired? ──► a = max(a / factor, floor) ◄─────┘
//! ```

use serde::{Deserialize, Serialize};

use super::bank::{Channel, ChannelBank, NeuronBank, CHANNEL_COUNT};
use super::izhikevich::NeuronParams;

// ============================================================================
// Configuration
// ============================================================================

/// Inclusive clipping range for an input current.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl CurrentRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `current` into the range. NaN maps to 0 clamped into range.
    #[inline]
    #[must_use]
    pub fn clip(&self, current: f64) -> f64 {
        let current = if current.is_nan() { 0.0 } else { current };
        current.max(self.min).min(self.max)
    }

    /// True when `min <= max` and both are finite
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// How the motion channel turns pointer speed into current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MotionDrive {
    /// `speed * roughness * gain` above the minimum speed
    #[default]
    Absolute,
    /// `(speed - avg_speed) * roughness * gain` when the deviation exceeds
    /// `threshold`; responds to accelerations rather than steady strokes
    Deviation {
        /// Minimum positive deviation from the running average
        threshold: f64,
    },
}

/// Encoder tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Integration step (ms)
    pub dt_ms: f64,
    /// Pressure (SA) channel parameters; `a` is the un-adapted value
    pub pressure: NeuronParams,
    /// Motion (RA) channel parameters
    pub motion: NeuronParams,
    /// Click (RA) channel parameters; `d` is the baseline reset increment
    pub click: NeuronParams,
    /// Click channel `d` while a burst window is open
    pub click_d_burst: f64,
    /// Magnitude a host applies on press
    pub press_magnitude: f64,
    /// Divisor applied to the pressure channel's `a` on each of its spikes
    pub adaptation_factor: f64,
    /// Lower bound for the adapted pressure `a`
    pub min_pressure_a: f64,
    /// Pressure change that counts as a press/release edge
    pub edge_epsilon: f64,
    /// Click current per unit of pressure change
    pub click_gain: f64,
    /// Ticks a burst keeps driving the click channel
    pub sustain_ticks: u32,
    /// Motion current per unit of `speed * roughness`
    pub motion_gain: f64,
    /// Speeds at or below this produce no motion current
    pub min_motion_speed: f64,
    /// Motion drive mode
    pub motion_drive: MotionDrive,
    /// Click current clip range
    pub click_clip: CurrentRange,
    /// Motion current clip range
    pub motion_clip: CurrentRange,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            dt_ms: 1.0,
            pressure: NeuronParams::PRESSURE,
            motion: NeuronParams::MOTION,
            click: NeuronParams::CLICK,
            click_d_burst: 20.0,
            press_magnitude: 12.0,
            adaptation_factor: 1.05,
            min_pressure_a: 0.001,
            edge_epsilon: 0.1,
            click_gain: 25.0,
            sustain_ticks: 3,
            motion_gain: 0.02,
            min_motion_speed: 1.0,
            motion_drive: MotionDrive::Absolute,
            click_clip: CurrentRange::new(-40.0, 40.0),
            motion_clip: CurrentRange::new(-30.0, 30.0),
        }
    }
}

// ============================================================================
// Step Output
// ============================================================================

/// Result of one encoder tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderStep {
    /// Fired flags, indexed by [`Channel`]
    pub fired: [bool; CHANNEL_COUNT],
    /// Post-step `(v, u)` per channel
    pub states: [(f64, f64); CHANNEL_COUNT],
    /// Currents fed to the bank this tick (after clipping)
    pub currents: [f64; CHANNEL_COUNT],
}

impl EncoderStep {
    /// Whether `channel` fired
    #[inline]
    #[must_use]
    pub fn fired(&self, channel: Channel) -> bool {
        self.fired[channel.index()]
    }

    /// Input current of `channel`
    #[inline]
    #[must_use]
    pub fn current(&self, channel: Channel) -> f64 {
        self.currents[channel.index()]
    }

    /// Number of channels that fired
    #[must_use]
    pub fn spike_count(&self) -> usize {
        self.fired.iter().filter(|&&f| f).count()
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Pointer-to-current translator owning the receptor bank.
#[derive(Clone, Debug)]
pub struct StimulusEncoder {
    config: EncoderConfig,
    bank: ChannelBank,
    pressure_input: f64,
    previous_pressure_input: f64,
    click_sustain_remaining: u32,
    click_sustain_magnitude: f64,
}

impl StimulusEncoder {
    /// Create an encoder with default tuning
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    /// Create with custom tuning
    #[must_use]
    pub fn with_config(config: EncoderConfig) -> Self {
        let bank = NeuronBank::new([config.pressure, config.motion, config.click]);
        Self {
            config,
            bank,
            pressure_input: 0.0,
            previous_pressure_input: 0.0,
            click_sustain_remaining: 0,
            click_sustain_magnitude: 0.0,
        }
    }

    /// Set the current held on the pressure channel.
    ///
    /// A strictly positive magnitude restores the pressure channel's `a` to
    /// its un-adapted value. Any change larger than the edge epsilon arms a
    /// click burst on the next [`step`](Self::step), including a drop to 0.
    pub fn set_pressure_input(&mut self, magnitude: f64) {
        self.pressure_input = magnitude;
        if magnitude > 0.0 {
            self.bank.channel_mut(Channel::Pressure).a = self.config.pressure.a;
        }
    }

    /// Shorthand for `set_pressure_input(press_magnitude)`
    pub fn press(&mut self) {
        self.set_pressure_input(self.config.press_magnitude);
    }

    /// Shorthand for `set_pressure_input(0.0)`
    pub fn release(&mut self) {
        self.set_pressure_input(0.0);
    }

    /// Run one tick.
    pub fn step(
        &mut self,
        pointer_speed: f64,
        avg_pointer_speed: f64,
        material_roughness: f64,
        pressed: bool,
    ) -> EncoderStep {
        let delta = self.pressure_input - self.previous_pressure_input;
        if libm::fabs(delta) > self.config.edge_epsilon {
            self.click_sustain_magnitude = libm::fabs(delta) * self.config.click_gain;
            self.click_sustain_remaining = self.config.sustain_ticks;
        }

        let click_current = if self.click_sustain_remaining > 0 {
            let current = self.click_sustain_magnitude;
            self.click_sustain_remaining -= 1;
            if self.click_sustain_remaining == 0 {
                self.click_sustain_magnitude = 0.0;
            }
            current
        } else {
            0.0
        };

        // Burst d is derived from the counter each tick, never left behind
        self.bank.channel_mut(Channel::Click).d = if self.click_sustain_remaining > 0 {
            self.config.click_d_burst
        } else {
            self.config.click.d
        };

        let motion_current =
            self.motion_current(pointer_speed, avg_pointer_speed, material_roughness, pressed);

        self.previous_pressure_input = self.pressure_input;

        let currents = [
            self.pressure_input,
            self.config.motion_clip.clip(motion_current),
            self.config.click_clip.clip(click_current),
        ];
        let fired = self.bank.step(self.config.dt_ms, currents);

        if fired[Channel::Pressure.index()] {
            let pressure = self.bank.channel_mut(Channel::Pressure);
            pressure.a = (pressure.a / self.config.adaptation_factor).max(self.config.min_pressure_a);
        }

        EncoderStep {
            fired,
            states: self.bank.states(),
            currents,
        }
    }

    fn motion_current(&self, speed: f64, avg_speed: f64, roughness: f64, pressed: bool) -> f64 {
        if !pressed || speed <= self.config.min_motion_speed {
            return 0.0;
        }
        match self.config.motion_drive {
            MotionDrive::Absolute => speed * roughness * self.config.motion_gain,
            MotionDrive::Deviation { threshold } => {
                let deviation = speed - avg_speed;
                if deviation > threshold {
                    deviation * roughness * self.config.motion_gain
                } else {
                    0.0
                }
            }
        }
    }

    /// Return all neurons to rest and clear edge and burst state.
    pub fn reset(&mut self) {
        self.bank = NeuronBank::new([self.config.pressure, self.config.motion, self.config.click]);
        self.pressure_input = 0.0;
        self.previous_pressure_input = 0.0;
        self.click_sustain_remaining = 0;
        self.click_sustain_magnitude = 0.0;
    }

    /// Current held on the pressure channel
    #[inline]
    #[must_use]
    pub fn pressure_input(&self) -> f64 {
        self.pressure_input
    }

    /// Ticks left in the click burst window
    #[inline]
    #[must_use]
    pub fn click_sustain_remaining(&self) -> u32 {
        self.click_sustain_remaining
    }

    /// Current fed to the click channel while the burst window is open
    #[inline]
    #[must_use]
    pub fn click_sustain_magnitude(&self) -> f64 {
        self.click_sustain_magnitude
    }

    /// The receptor bank
    #[inline]
    #[must_use]
    pub fn bank(&self) -> &ChannelBank {
        &self.bank
    }

    /// Encoder tuning
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl Default for StimulusEncoder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{vec, vec::Vec};

    #[test]
    fn test_current_range_clip() {
        let range = CurrentRange::new(-30.0, 30.0);
        assert_eq!(range.clip(45.0), 30.0);
        assert_eq!(range.clip(-45.0), -30.0);
        assert_eq!(range.clip(12.5), 12.5);
        assert_eq!(range.clip(f64::NAN), 0.0);
        assert!(!CurrentRange::new(1.0, -1.0).is_valid());
    }

    #[test]
    fn test_idle_encoder_is_silent() {
        let mut encoder = StimulusEncoder::new();
        for _ in 0..500 {
            let step = encoder.step(0.0, 0.0, 1.0, false);
            assert_eq!(step.spike_count(), 0);
            assert_eq!(step.currents, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_press_arms_click_burst() {
        let mut encoder = StimulusEncoder::new();
        encoder.press();
        let step = encoder.step(0.0, 0.0, 1.0, true);

        // 12 * 25 = 300, clipped to 40
        assert_eq!(step.current(Channel::Click), 40.0);
        assert_eq!(encoder.click_sustain_remaining(), 2);
        assert_eq!(encoder.bank().channel(Channel::Click).d, 20.0);
    }

    #[test]
    fn test_sustain_counts_down_and_restores_d() {
        let mut encoder = StimulusEncoder::new();
        encoder.press();

        let mut remaining = Vec::new();
        for _ in 0..5 {
            encoder.step(0.0, 0.0, 1.0, true);
            remaining.push(encoder.click_sustain_remaining());
        }
        assert_eq!(remaining, vec![2, 1, 0, 0, 0]);
        assert_eq!(encoder.click_sustain_magnitude(), 0.0);

        assert_eq!(encoder.bank().channel(Channel::Click).d, 6.0);
    }

    #[test]
    fn test_release_edge_rearms() {
        let mut encoder = StimulusEncoder::new();
        encoder.press();
        for _ in 0..10 {
            encoder.step(0.0, 0.0, 1.0, true);
        }
        assert_eq!(encoder.click_sustain_remaining(), 0);

        encoder.release();
        let step = encoder.step(0.0, 0.0, 1.0, false);
        assert_eq!(step.current(Channel::Click), 40.0);
        assert_eq!(encoder.click_sustain_remaining(), 2);
    }

    #[test]
    fn test_motion_gated_by_press() {
        let mut encoder = StimulusEncoder::new();
        let step = encoder.step(2000.0, 1500.0, 1.2, false);
        assert_eq!(step.current(Channel::Motion), 0.0);
    }

    #[test]
    fn test_motion_current_scaled_and_clipped() {
        let mut encoder = StimulusEncoder::new();
        let step = encoder.step(500.0, 0.0, 0.5, true);
        assert!((step.current(Channel::Motion) - 5.0).abs() < 1e-12);

        let step = encoder.step(5000.0, 0.0, 1.0, true);
        assert_eq!(step.current(Channel::Motion), 30.0);

        let step = encoder.step(0.5, 0.0, 1.0, true);
        assert_eq!(step.current(Channel::Motion), 0.0);
    }

    #[test]
    fn test_deviation_drive() {
        let config = EncoderConfig {
            motion_drive: MotionDrive::Deviation { threshold: 5.0 },
            ..EncoderConfig::default()
        };
        let mut encoder = StimulusEncoder::with_config(config);

        let steady = encoder.step(800.0, 798.0, 1.0, true);
        assert_eq!(steady.current(Channel::Motion), 0.0);

        let surge = encoder.step(800.0, 700.0, 1.0, true);
        assert!((surge.current(Channel::Motion) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_pressure_adaptation_and_floor() {
        let config = EncoderConfig {
            min_pressure_a: 0.03,
            ..EncoderConfig::default()
        };
        let mut encoder = StimulusEncoder::with_config(config);
        encoder.set_pressure_input(30.0);

        let mut spikes = 0;
        for _ in 0..5000 {
            if encoder.step(0.0, 0.0, 1.0, true).fired(Channel::Pressure) {
                spikes += 1;
            }
            assert!(encoder.bank().channel(Channel::Pressure).a >= 0.03);
        }
        assert!(spikes > 0);
        assert!(encoder.bank().channel(Channel::Pressure).a < 0.05);

        // Fresh press un-adapts
        encoder.set_pressure_input(30.0);
        assert_eq!(encoder.bank().channel(Channel::Pressure).a, 0.05);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut encoder = StimulusEncoder::new();
        encoder.press();
        encoder.step(100.0, 0.0, 1.0, true);
        encoder.reset();
        assert_eq!(encoder.pressure_input(), 0.0);
        assert_eq!(encoder.click_sustain_remaining(), 0);
        assert_eq!(encoder.bank().states()[0], encoder.config().pressure.initial_state());
    }
}
