//! Haptic configuration
//!
//! [`HapticConfig`] aggregates everything the host runtime needs: encoder
//! tuning, per-channel grain settings, the named material table, the UDP
//! server and the tick scheduler. Every section defaults to the built-in
//! tuning, so a partial JSON file only overrides what it names.
//!
//! ```json
//! {
//!   "default_material": "wood",
//!   "sound": { "motion": { "freq_hz": 40.0 } },
//!   "materials": { "wood": { "r": 0.8, "f": 0.9, "type": "wood", "warmth": 1.0 } }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spiketouch_core::audio::{GrainSpec, MaterialProfile, MaterialShape, DEFAULT_SAMPLE_RATE, MAX_DURATION_MS};
use spiketouch_core::math::ramp;
use spiketouch_core::sns::EncoderConfig;

use crate::error::{ConfigError, ConfigResult};

// ============================================================================
// Sound
// ============================================================================

/// One channel's grain and playback level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainConfig {
    /// Base frequency before material scaling (Hz)
    pub freq_hz: f64,
    /// Grain length (ms)
    pub duration_ms: f64,
    /// Synthesis amplitude
    pub amplitude: f64,
    /// Release at the tail (ms)
    pub fade_out_ms: f64,
    /// Player volume
    pub volume: f32,
}

impl GrainConfig {
    /// Create a grain config
    pub const fn new(freq_hz: f64, duration_ms: f64, amplitude: f64, fade_out_ms: f64, volume: f32) -> Self {
        Self {
            freq_hz,
            duration_ms,
            amplitude,
            fade_out_ms,
            volume,
        }
    }

    /// Grain request at the base frequency
    pub fn spec(&self) -> GrainSpec {
        GrainSpec::new(self.freq_hz, self.duration_ms, self.amplitude, self.fade_out_ms)
    }

    /// Grain request with the material's pitch scaling
    pub fn spec_for(&self, material: &MaterialProfile) -> GrainSpec {
        GrainSpec {
            freq_hz: material.scaled_hz(self.freq_hz),
            ..self.spec()
        }
    }

    fn validate(&self, section: &str) -> ConfigResult<()> {
        if !(self.freq_hz.is_finite() && self.freq_hz > 0.0) {
            return Err(ConfigError::invalid_value(format!("sound.{section}.freq_hz"), "must be positive"));
        }
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return Err(ConfigError::invalid_value(format!("sound.{section}.duration_ms"), "must be positive"));
        }
        if self.duration_ms > MAX_DURATION_MS {
            return Err(ConfigError::invalid_value(
                format!("sound.{section}.duration_ms"),
                format!("must not exceed {MAX_DURATION_MS} ms"),
            ));
        }
        if !self.fade_out_ms.is_finite() || self.fade_out_ms < 0.0 {
            return Err(ConfigError::invalid_value(format!("sound.{section}.fade_out_ms"), "must be non-negative"));
        }
        Ok(())
    }
}

impl Default for GrainConfig {
    fn default() -> Self {
        Self::new(50.0, 70.0, 1.0, 5.0, 1.0)
    }
}

/// Motion volume as a function of pointer speed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeRamp {
    /// At or below this speed, `min_volume` (px/s)
    pub min_speed: f64,
    /// At or above this speed, `max_volume` (px/s)
    pub max_speed: f64,
    /// Quietest motion grain
    pub min_volume: f32,
    /// Loudest motion grain
    pub max_volume: f32,
}

impl VolumeRamp {
    /// Volume for `speed`
    pub fn volume(&self, speed: f64) -> f32 {
        ramp(
            speed,
            self.min_speed,
            self.max_speed,
            f64::from(self.min_volume),
            f64::from(self.max_volume),
        ) as f32
    }
}

impl Default for VolumeRamp {
    fn default() -> Self {
        Self {
            min_speed: 100.0,
            max_speed: 5000.0,
            min_volume: 0.4,
            max_volume: 1.0,
        }
    }
}

/// Grain settings for all three channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Output sample rate (Hz)
    pub sample_rate: u32,
    /// Pressure (SA) grain, always a plain sine
    pub pressure: GrainConfig,
    /// Motion (RA) grain, rendered with the active material
    pub motion: GrainConfig,
    /// Click (RA) grain, rendered with the active material
    pub click: GrainConfig,
    /// Speed-to-volume ramp for the motion grain
    pub motion_volume: VolumeRamp,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            pressure: GrainConfig::new(25.0, 120.0, 0.6, 10.0, 1.0),
            motion: GrainConfig::new(35.0, 90.0, 1.0, 5.0, 1.0),
            click: GrainConfig::new(50.0, 70.0, 1.0, 5.0, 1.0),
            motion_volume: VolumeRamp::default(),
        }
    }
}

// ============================================================================
// Pointer, Server, Scheduler
// ============================================================================

/// Pointer tracking limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Speeds above this are clamped (px/s)
    pub max_speed: f64,
    /// Moves closer together than this are coalesced (ms)
    pub min_interval_ms: f64,
    /// Speed drops to 0 after this long without a move (ms)
    pub stop_threshold_ms: f64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            max_speed: 3000.0,
            min_interval_ms: 1.0,
            stop_threshold_ms: 50.0,
        }
    }
}

/// UDP control server settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,
    /// Receive buffer size (bytes)
    pub recv_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5005".to_string(),
            recv_buffer: 65_536,
        }
    }
}

/// Fixed-rate loop settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick period (µs)
    pub tick_us: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_us: 1_000 }
    }
}

// ============================================================================
// Top Level
// ============================================================================

/// Complete host configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    /// Receptor and encoder tuning
    pub encoder: EncoderConfig,
    /// Grain settings
    pub sound: SoundConfig,
    /// Named materials
    pub materials: BTreeMap<String, MaterialProfile>,
    /// Material active at startup
    pub default_material: String,
    /// Pointer tracking
    pub pointer: PointerConfig,
    /// UDP control server
    pub server: ServerConfig,
    /// Tick scheduler
    pub scheduler: SchedulerConfig,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig::default(),
            sound: SoundConfig::default(),
            materials: default_materials(),
            default_material: "glass".to_string(),
            pointer: PointerConfig::default(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Built-in material table
pub fn default_materials() -> BTreeMap<String, MaterialProfile> {
    let table = [
        ("glass", 0.3, 1.3, MaterialShape::Glass { brightness: 2.0 }),
        ("metal", 0.5, 1.5, MaterialShape::Metal { resonance: 1.5 }),
        ("wood", 0.8, 0.9, MaterialShape::Wood { warmth: 1.0 }),
        ("plastic", 0.4, 1.0, MaterialShape::Plastic { hardness: 1.1 }),
        ("fabric", 1.2, 0.7, MaterialShape::Fabric { softness: 1.0 }),
        ("ceramic", 0.6, 1.2, MaterialShape::Ceramic { brittleness: 1.5 }),
        ("rubber", 1.0, 0.8, MaterialShape::Rubber { elasticity: 1.0 }),
        ("smooth", 0.3, 1.0, MaterialShape::Sine),
        ("medium", 0.7, 1.1, MaterialShape::Sine),
        ("rough", 1.2, 1.2, MaterialShape::Sine),
    ];
    table
        .into_iter()
        .map(|(name, roughness, freq_scale, shape)| {
            (name.to_string(), MaterialProfile { roughness, freq_scale, shape })
        })
        .collect()
}

impl HapticConfig {
    /// Load configuration from a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileRead`] if the file cannot be read,
    /// [`ConfigError::Parse`] for malformed JSON, or any validation error.
    pub fn from_json(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileRead`] on I/O failure.
    pub fn to_json(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a material by name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownMaterial`] if the table has no such entry.
    pub fn material(&self, name: &str) -> ConfigResult<&MaterialProfile> {
        self.materials.get(name).ok_or_else(|| ConfigError::UnknownMaterial {
            name: name.to_string(),
        })
    }

    /// Check every value the engine relies on.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError::InvalidValue`] or
    /// [`ConfigError::UnknownMaterial`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        let enc = &self.encoder;

        if !(enc.dt_ms.is_finite() && enc.dt_ms > 0.0) {
            return Err(ConfigError::invalid_value("encoder.dt_ms", "must be positive"));
        }
        if enc.sustain_ticks == 0 {
            return Err(ConfigError::invalid_value("encoder.sustain_ticks", "must be at least 1"));
        }
        if !(enc.adaptation_factor.is_finite() && enc.adaptation_factor > 1.0) {
            return Err(ConfigError::invalid_value(
                "encoder.adaptation_factor",
                "must be greater than 1",
            ));
        }
        if !(enc.min_pressure_a.is_finite() && enc.min_pressure_a > 0.0) {
            return Err(ConfigError::invalid_value("encoder.min_pressure_a", "must be positive"));
        }
        for (field, range) in [("encoder.click_clip", enc.click_clip), ("encoder.motion_clip", enc.motion_clip)] {
            if !range.is_valid() {
                return Err(ConfigError::invalid_value(field, "min must not exceed max"));
            }
        }
        for (field, params) in [
            ("encoder.pressure", enc.pressure),
            ("encoder.motion", enc.motion),
            ("encoder.click", enc.click),
        ] {
            if !params.is_finite() {
                return Err(ConfigError::invalid_value(field, "neuron parameters must be finite"));
            }
        }

        if self.sound.sample_rate == 0 {
            return Err(ConfigError::invalid_value("sound.sample_rate", "must be positive"));
        }
        self.sound.pressure.validate("pressure")?;
        self.sound.motion.validate("motion")?;
        self.sound.click.validate("click")?;
        let vol = &self.sound.motion_volume;
        if vol.min_speed >= vol.max_speed {
            return Err(ConfigError::invalid_value(
                "sound.motion_volume",
                "min_speed must be below max_speed",
            ));
        }

        for (name, profile) in &self.materials {
            profile.validate().map_err(|e| ConfigError::material(name, &e))?;
        }
        self.material(&self.default_material)?;

        if self.pointer.max_speed <= 0.0 {
            return Err(ConfigError::invalid_value("pointer.max_speed", "must be positive"));
        }
        if self.server.recv_buffer == 0 {
            return Err(ConfigError::invalid_value("server.recv_buffer", "must be positive"));
        }
        if self.scheduler.tick_us == 0 {
            return Err(ConfigError::invalid_value("scheduler.tick_us", "must be positive"));
        }
        // One encoder step per tick, so the two periods must agree
        if (enc.dt_ms * 1000.0 - self.scheduler.tick_us as f64).abs() >= 1.0 {
            return Err(ConfigError::invalid_value(
                "scheduler.tick_us",
                format!("must equal encoder.dt_ms ({} ms) in µs", enc.dt_ms),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiketouch_core::audio::WaveformFamily;

    #[test]
    fn test_default_validates() {
        let config = HapticConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.materials.len(), 10);
        assert_eq!(config.material("metal").unwrap().family(), WaveformFamily::Metal);
    }

    #[test]
    fn test_unknown_default_material() {
        let config = HapticConfig {
            default_material: "velvet".to_string(),
            ..HapticConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::UnknownMaterial { .. })));
    }

    #[test]
    fn test_rejects_bad_encoder_values() {
        let mut config = HapticConfig::default();
        config.encoder.adaptation_factor = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "encoder.adaptation_factor"
        ));

        let mut config = HapticConfig::default();
        config.encoder.sustain_ticks = 0;
        assert!(config.validate().is_err());

        let mut config = HapticConfig::default();
        config.encoder.motion_clip.min = 50.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_period_must_match_dt() {
        let mut config = HapticConfig::default();
        config.scheduler.tick_us = 2_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "scheduler.tick_us"
        ));

        config.encoder.dt_ms = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grain_longer_than_synth_limit() {
        let mut config = HapticConfig::default();
        config.sound.click.duration_ms = MAX_DURATION_MS + 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "sound.click.duration_ms"
        ));

        config.sound.click.duration_ms = MAX_DURATION_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "default_material": "wood",
            "sound": { "motion": { "freq_hz": 40.0 } }
        }"#;
        let config: HapticConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_material, "wood");
        assert_eq!(config.sound.motion.freq_hz, 40.0);
        assert_eq!(config.sound.motion.duration_ms, 70.0);
        assert_eq!(config.sound.click, SoundConfig::default().click);
    }

    #[test]
    fn test_material_short_keys() {
        let json = r#"{ "r": 0.4, "f": 1.0, "type": "plastic", "hardness": 1.1 }"#;
        let profile: MaterialProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.shape, MaterialShape::Plastic { hardness: 1.1 });
        assert_eq!(profile.roughness, 0.4);
    }

    #[test]
    fn test_volume_ramp() {
        let ramp = VolumeRamp::default();
        assert_eq!(ramp.volume(0.0), 0.4);
        assert_eq!(ramp.volume(10_000.0), 1.0);
        let mut last = 0.0;
        for speed in (0..60).map(|i| f64::from(i) * 100.0) {
            let v = ramp.volume(speed);
            assert!(v >= last && (0.4..=1.0).contains(&v));
            last = v;
        }
    }

    #[test]
    fn test_grain_spec_for_material() {
        let sound = SoundConfig::default();
        let medium = MaterialProfile::sine(0.7, 1.1);
        let spec = sound.motion.spec_for(&medium);
        assert_eq!(spec.freq_hz, 38.0);
        assert_eq!(spec.duration_ms, 90.0);
    }
}
