//! Fixed-size neuron bank
//!
//! A bank steps `N` independent [`IzhikevichNeuron`]s with one shared `dt`.
//! Channels never read each other's state, so the order of updates inside a
//! step is irrelevant. The channel count is a const generic and cannot
//! change after construction.

use core::array;

use serde::{Deserialize, Serialize};

use super::izhikevich::{IzhikevichNeuron, NeuronParams};

// ============================================================================
// Channels
// ============================================================================

/// Number of receptor channels in the haptic bank
pub const CHANNEL_COUNT: usize = 3;

/// Receptor channel, index-stable within a [`ChannelBank`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Channel {
    /// Slowly adapting pressure receptor (SA)
    Pressure = 0,
    /// Rapidly adapting motion receptor (RA)
    Motion = 1,
    /// Rapidly adapting press/release edge receptor (RA)
    Click = 2,
}

impl Channel {
    /// All channels in index order
    pub const ALL: [Self; CHANNEL_COUNT] = [Self::Pressure, Self::Motion, Self::Click];

    /// Bank index of this channel
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Channel for a bank index
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Pressure),
            1 => Some(Self::Motion),
            2 => Some(Self::Click),
            _ => None,
        }
    }

    /// Short label
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::Motion => "motion",
            Self::Click => "click",
        }
    }
}

// ============================================================================
// Bank
// ============================================================================

/// Parallel collection of `N` spiking neurons.
#[derive(Clone, Debug, PartialEq)]
pub struct NeuronBank<const N: usize> {
    neurons: [IzhikevichNeuron; N],
}

/// The three-channel bank driven by the stimulus encoder
pub type ChannelBank = NeuronBank<CHANNEL_COUNT>;

impl<const N: usize> NeuronBank<N> {
    /// Create a bank with one parameter set per channel.
    #[must_use]
    pub fn new(params: [NeuronParams; N]) -> Self {
        Self {
            neurons: params.map(IzhikevichNeuron::new),
        }
    }

    /// Step every channel once and report which fired.
    pub fn step(&mut self, dt_ms: f64, currents: [f64; N]) -> [bool; N] {
        array::from_fn(|i| self.neurons[i].step(dt_ms, currents[i]))
    }

    /// Post-step `(v, u)` of every channel
    #[must_use]
    pub fn states(&self) -> [(f64, f64); N] {
        array::from_fn(|i| self.neurons[i].state())
    }

    /// Neuron at `index`
    #[inline]
    #[must_use]
    pub fn neuron(&self, index: usize) -> Option<&IzhikevichNeuron> {
        self.neurons.get(index)
    }

    /// Mutable neuron at `index`, for runtime parameter changes
    #[inline]
    pub fn neuron_mut(&mut self, index: usize) -> Option<&mut IzhikevichNeuron> {
        self.neurons.get_mut(index)
    }

    /// Channel count
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// True only for a zero-channel bank
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Return every channel to rest
    pub fn reset(&mut self) {
        self.neurons.iter_mut().for_each(IzhikevichNeuron::reset);
    }
}

impl ChannelBank {
    /// Neuron for a named channel
    #[inline]
    #[must_use]
    pub fn channel(&self, channel: Channel) -> &IzhikevichNeuron {
        &self.neurons[channel.index()]
    }

    /// Mutable neuron for a named channel
    #[inline]
    pub fn channel_mut(&mut self, channel: Channel) -> &mut IzhikevichNeuron {
        &mut self.neurons[channel.index()]
    }
}
