//! Spiking mechanoreceptor simulation
//!
//! Three receptor channels share one fixed-step loop:
//!
//! - **Pressure (SA)**: slowly adapting, driven by the held press magnitude
//!   and desensitized on every one of its own spikes
//! - **Motion (RA)**: rapidly adapting, driven by pointer speed scaled by
//!   material roughness while pressed
//! - **Click (RA)**: rapidly adapting, driven by a short burst after each
//!   press or release edge
//!
//! # Example
//!
//! ```rust
//! use spiketouch_core::sns::{Channel, StimulusEncoder};
//!
//! let mut encoder = StimulusEncoder::new();
//! encoder.press();
//!
//! let clicked = (0..5).any(|_| encoder.step(0.0, 0.0, 1.0, true).fired(Channel::Click));
//! assert!(clicked);
//! ```

pub mod bank;
pub mod encoder;
pub mod izhikevich;

pub use bank::{Channel, ChannelBank, NeuronBank, CHANNEL_COUNT};
pub use encoder::{CurrentRange, EncoderConfig, EncoderStep, MotionDrive, StimulusEncoder};
pub use izhikevich::{IzhikevichNeuron, NeuronParams, SPIKE_THRESHOLD_MV};
