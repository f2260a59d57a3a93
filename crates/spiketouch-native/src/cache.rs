//! Grain cache
//!
//! Synthesizing a grain costs thousands of transcendental calls, far too much
//! for a 1 ms tick. The cache renders each distinct grain once and hands out
//! shared, immutable buffers afterwards. Keys quantize frequency to whole
//! hertz, length and release to microseconds, and amplitude and the shape
//! parameter to thousandths. The buffer is rendered from the quantized
//! shape and spec, so a key always maps to the same samples.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use spiketouch_core::audio::{GrainSpec, MaterialProfile, MaterialShape, SoundBuffer, WaveformFamily, WaveformSynthesizer};
use tracing::debug;

use crate::config::SoundConfig;

/// Quantized identity of a rendered grain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GrainKey {
    /// Waveform family
    pub family: WaveformFamily,
    /// Family shape parameter in thousandths (0 for sine)
    pub shape_milli: u32,
    /// Frequency, rounded (Hz)
    pub freq_hz: u32,
    /// Length, rounded (µs)
    pub duration_us: u32,
    /// Amplitude in thousandths, clamped to `[0, 1000]`
    pub amplitude_milli: u32,
    /// Release, rounded (µs)
    pub fade_out_us: u32,
}

fn quantize(value: f64, scale: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        (value * scale).round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

impl GrainKey {
    /// Key for rendering `spec` with `shape`
    pub fn new(shape: &MaterialShape, spec: GrainSpec) -> Self {
        Self {
            family: shape.family(),
            shape_milli: quantize(shape.parameter().unwrap_or(0.0), 1000.0),
            freq_hz: quantize(spec.freq_hz, 1.0),
            duration_us: quantize(spec.duration_ms, 1000.0),
            amplitude_milli: quantize(spec.amplitude.min(1.0), 1000.0),
            fade_out_us: quantize(spec.fade_out_ms, 1000.0),
        }
    }

    /// The quantized shape this key stands for
    pub fn shape(&self) -> MaterialShape {
        MaterialShape::with_parameter(self.family, f64::from(self.shape_milli) / 1000.0)
    }

    /// The quantized grain request this key stands for
    pub fn spec(&self) -> GrainSpec {
        GrainSpec::new(
            f64::from(self.freq_hz),
            f64::from(self.duration_us) / 1000.0,
            f64::from(self.amplitude_milli) / 1000.0,
            f64::from(self.fade_out_us) / 1000.0,
        )
    }
}

/// Thread-safe memo of rendered grains.
#[derive(Debug)]
pub struct GrainCache {
    synth: WaveformSynthesizer,
    entries: RwLock<HashMap<GrainKey, Arc<SoundBuffer>>>,
}

impl GrainCache {
    /// Create an empty cache around `synth`
    pub fn new(synth: WaveformSynthesizer) -> Self {
        Self {
            synth,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Synthesizer used for misses
    pub fn synthesizer(&self) -> &WaveformSynthesizer {
        &self.synth
    }

    /// Shared buffer for `spec` rendered with `shape`, synthesizing on a miss.
    pub fn get_or_synthesize(&self, shape: &MaterialShape, spec: GrainSpec) -> Arc<SoundBuffer> {
        let key = GrainKey::new(shape, spec);
        if let Some(buffer) = self.entries.read().get(&key) {
            return Arc::clone(buffer);
        }

        debug!(?key, "Grain cache miss");
        let rendered = Arc::new(self.synth.render(&key.shape(), key.spec()));

        // A racing writer may have inserted first; keep whichever landed
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_insert(rendered))
    }

    /// Render the motion and click grains of every material, and the
    /// pressure grain, ahead of the tick loop.
    pub fn prewarm<'a>(
        &self,
        materials: impl IntoIterator<Item = &'a MaterialProfile>,
        sound: &SoundConfig,
    ) -> usize {
        let before = self.len();
        self.get_or_synthesize(&MaterialShape::Sine, sound.pressure.spec());
        for material in materials {
            self.get_or_synthesize(&material.shape, sound.motion.spec_for(material));
            self.get_or_synthesize(&material.shape, sound.click.spec_for(material));
        }
        let added = self.len() - before;
        debug!(added, total = self.len(), "Grain cache prewarmed");
        added
    }

    /// Number of cached grains
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every cached grain. Buffers already handed out stay valid.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for GrainCache {
    fn default() -> Self {
        Self::new(WaveformSynthesizer::default())
    }
}
