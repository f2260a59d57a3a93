//! Material-colored haptic grains
//!
//! [`material`] names the eight waveform families and the per-material
//! roughness and pitch scaling. [`synth`] turns a family, a frequency and an
//! envelope into 16-bit PCM.

pub mod material;
pub mod synth;

pub use material::{MaterialProfile, MaterialShape, WaveformFamily};
pub use synth::{GrainSpec, SoundBuffer, WaveformSynthesizer, DEFAULT_SAMPLE_RATE, MAX_DURATION_MS};
