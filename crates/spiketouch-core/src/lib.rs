//! SpikeTouch Core - `no_std` haptic encoding and synthesis
//!
//! This crate holds the pure parts of the SpikeTouch haptic pipeline: the
//! spiking receptor model that turns pointer input into spike events, and the
//! waveform synthesizer that turns a spike on a channel into a short PCM
//! grain colored by the selected material. It needs `alloc` but not `std`.
//!
//! # Modules
//!
//! - [`sns`]: Izhikevich neurons, the three-channel bank and the stimulus encoder
//! - [`audio`]: Material families and the grain synthesizer
//! - [`math`]: Pointer speed, smoothing and deterministic noise
//! - [`error`]: Material validation errors
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```rust
//! use spiketouch_core::audio::{GrainSpec, MaterialProfile, WaveformSynthesizer};
//! use spiketouch_core::sns::{Channel, StimulusEncoder};
//!
//! let mut encoder = StimulusEncoder::new();
//! let synth = WaveformSynthesizer::default();
//! let material = MaterialProfile::sine(0.3, 1.0);
//!
//! encoder.press();
//! for _ in 0..10 {
//!     let step = encoder.step(0.0, 0.0, material.roughness, true);
//!     if step.fired(Channel::Click) {
//!         let grain = GrainSpec::new(material.scaled_hz(50.0), 70.0, 1.0, 5.0);
//!         let pcm = synth.synthesize(&material, grain);
//!         assert_eq!(pcm.len(), 3087);
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod audio;
pub mod error;
pub mod math;
pub mod sns;

// Re-export commonly used types at crate root
pub use audio::{GrainSpec, MaterialProfile, MaterialShape, SoundBuffer, WaveformFamily, WaveformSynthesizer};
pub use error::MaterialError;
pub use math::{NoiseSource, SpeedAverage};
pub use sns::{Channel, EncoderConfig, EncoderStep, IzhikevichNeuron, NeuronParams, StimulusEncoder};
