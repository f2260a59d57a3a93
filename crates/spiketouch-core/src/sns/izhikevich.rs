//! Izhikevich Spiking Neuron
//!
//! Two-variable model with a quadratic membrane term and a linear recovery
//! variable, integrated with forward Euler at a fixed step:
//!
//! ```text
//! v' = 0.04 v² + 5 v + 140 - u + I
//! u' = a (b v - u)
//! if v >= 30 mV: v = c, u = u + d
//! ```
//!
//! The recovery update uses the freshly integrated `v`, and the reset happens
//! inside the same [`IzhikevichNeuron::step`] call that crossed threshold, so
//! a caller seeing `true` always observes the post-reset state.
//!
//! # Example
//!
//! ```rust
//! use spiketouch_core::sns::izhikevich::{IzhikevichNeuron, NeuronParams};
//!
//! let mut neuron = IzhikevichNeuron::new(NeuronParams::REGULAR_SPIKING);
//! let fired = (0..200).any(|_| neuron.step(1.0, 10.0));
//! assert!(fired);
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Spike threshold (mV)
pub const SPIKE_THRESHOLD_MV: f64 = 30.0;

// ============================================================================
// Parameters
// ============================================================================

/// Shape parameters of one Izhikevich neuron.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronParams {
    /// Recovery time scale
    pub a: f64,
    /// Recovery sensitivity to sub-threshold `v`
    pub b: f64,
    /// Post-spike reset potential (mV)
    pub c: f64,
    /// Post-spike recovery increment
    pub d: f64,
    /// Starting membrane potential for parameter sets with no resting
    /// state (mV)
    pub v_init: f64,
}

impl NeuronParams {
    /// Classic cortical regular-spiking cell
    pub const REGULAR_SPIKING: Self = Self::new(0.02, 0.2, -65.0, 8.0, -70.0);

    /// Slowly adapting pressure receptor (SA-I like)
    pub const PRESSURE: Self = Self::new(0.05, 0.25, -65.0, 6.0, -70.0);

    /// Rapidly adapting motion receptor (RA-I like)
    pub const MOTION: Self = Self::new(0.4, 0.25, -65.0, 1.5, -65.0);

    /// Rapidly adapting press/release edge receptor
    pub const CLICK: Self = Self::new(0.3, 0.25, -65.0, 6.0, -65.0);

    /// Create a parameter set
    #[inline]
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, v_init: f64) -> Self {
        Self { a, b, c, d, v_init }
    }

    /// Stable membrane potential under zero input (mV).
    ///
    /// This is the lower intersection of the nullclines `u = b v` and
    /// `0.04 v² + 5 v + 140 = u`. `None` when they do not cross, in which
    /// case the cell fires tonically at rest.
    #[must_use]
    pub fn resting_potential(&self) -> Option<f64> {
        let p = 5.0 - self.b;
        let disc = p * p - 4.0 * 0.04 * 140.0;
        if disc.is_nan() || disc < 0.0 {
            return None;
        }
        Some((-p - libm::sqrt(disc)) / (2.0 * 0.04))
    }

    /// `(v, u)` a neuron starts from: the resting point, or
    /// `(v_init, b * v_init)` when there is none.
    #[must_use]
    pub fn initial_state(&self) -> (f64, f64) {
        let v = self.resting_potential().unwrap_or(self.v_init);
        (v, self.b * v)
    }

    /// True when every field is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.v_init]
            .iter()
            .all(|x| x.is_finite())
    }
}

impl Default for NeuronParams {
    fn default() -> Self {
        Self::REGULAR_SPIKING
    }
}

// ============================================================================
// Neuron
// ============================================================================

/// Izhikevich neuron state machine.
///
/// `a`, `b`, `c`, `d` stay public so a host can retune a channel between
/// ticks. `v` and `u` only change through [`step`](Self::step) and
/// [`reset`](Self::reset).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IzhikevichNeuron {
    /// Recovery time scale
    pub a: f64,
    /// Recovery sensitivity
    pub b: f64,
    /// Reset potential (mV)
    pub c: f64,
    /// Recovery increment on spike
    pub d: f64,
    /// Fallback starting potential (mV), see [`NeuronParams::initial_state`]
    pub v_init: f64,
    /// Membrane potential (mV)
    v: f64,
    /// Recovery variable
    u: f64,
}

impl IzhikevichNeuron {
    /// Create a neuron sitting on its resting point, so zero input never
    /// produces a start-up spike.
    #[inline]
    #[must_use]
    pub fn new(params: NeuronParams) -> Self {
        let (v, u) = params.initial_state();
        Self {
            a: params.a,
            b: params.b,
            c: params.c,
            d: params.d,
            v_init: params.v_init,
            v,
            u,
        }
    }

    /// Advance one Euler step of `dt_ms` with input current `input`.
    ///
    /// Returns `true` if the neuron fired during this step.
    pub fn step(&mut self, dt_ms: f64, input: f64) -> bool {
        let dv = 0.04 * self.v * self.v + 5.0 * self.v + 140.0 - self.u + input;
        self.v += dt_ms * dv;

        let du = self.a * (self.b * self.v - self.u);
        self.u += dt_ms * du;

        if self.v >= SPIKE_THRESHOLD_MV {
            self.v = self.c;
            self.u += self.d;
            true
        } else {
            false
        }
    }

    /// Membrane potential (mV)
    #[inline]
    #[must_use]
    pub fn v(&self) -> f64 {
        self.v
    }

    /// Recovery variable
    #[inline]
    #[must_use]
    pub fn u(&self) -> f64 {
        self.u
    }

    /// `(v, u)` pair
    #[inline]
    #[must_use]
    pub fn state(&self) -> (f64, f64) {
        (self.v, self.u)
    }

    /// Current shape parameters
    #[must_use]
    pub fn params(&self) -> NeuronParams {
        NeuronParams::new(self.a, self.b, self.c, self.d, self.v_init)
    }

    /// Return to the resting state without touching the shape parameters.
    pub fn reset(&mut self) {
        (self.v, self.u) = self.params().initial_state();
    }
}

impl Default for IzhikevichNeuron {
    fn default() -> Self {
        Self::new(NeuronParams::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_initial_state() {
        // b = 0.2 puts the resting point exactly on -70 mV
        let neuron = IzhikevichNeuron::new(NeuronParams::REGULAR_SPIKING);
        assert!((neuron.v() + 70.0).abs() < 1e-9);
        assert!((neuron.u() - 0.2 * neuron.v()).abs() < 1e-12);

        let pressure = IzhikevichNeuron::new(NeuronParams::PRESSURE);
        let rest = NeuronParams::PRESSURE.resting_potential().unwrap();
        assert_eq!(pressure.state(), (rest, 0.25 * rest));
        assert!(rest > -65.0 && rest < -64.0, "rest = {rest}");
    }

    #[test]
    fn test_no_rest_falls_back_to_v_init() {
        let params = NeuronParams::new(0.02, 1.0, -65.0, 2.0, -60.0);
        assert_eq!(params.resting_potential(), None);
        assert_eq!(IzhikevichNeuron::new(params).state(), (-60.0, -60.0));
    }

    #[test]
    fn test_receptor_tunings_quiet_without_input() {
        for params in [NeuronParams::PRESSURE, NeuronParams::MOTION, NeuronParams::CLICK] {
            let mut neuron = IzhikevichNeuron::new(params);
            let first = (0..5000).position(|_| neuron.step(1.0, 0.0));
            assert_eq!(first, None, "{params:?}");
        }
    }

    #[test]
    fn test_quiet_without_input() {
        let mut neuron = IzhikevichNeuron::new(NeuronParams::REGULAR_SPIKING);
        for _ in 0..1000 {
            assert!(!neuron.step(1.0, 0.0));
        }
    }

    #[test]
    fn test_spike_and_reset() {
        let mut neuron = IzhikevichNeuron::new(NeuronParams::REGULAR_SPIKING);
        let mut fired = false;
        for _ in 0..100 {
            if neuron.step(1.0, 15.0) {
                fired = true;
                break;
            }
        }
        assert!(fired);
        assert_eq!(neuron.v(), neuron.c);
    }

    #[test]
    fn test_threshold_invariant() {
        let mut neuron = IzhikevichNeuron::new(NeuronParams::CLICK);
        for tick in 0..2000 {
            let input = if tick % 300 < 150 { 25.0 } else { 0.0 };

            // Reproduce the Euler update to get u just before the reset
            let (v0, u0) = neuron.state();
            let v1 = v0 + (0.04 * v0 * v0 + 5.0 * v0 + 140.0 - u0 + input);
            let u1 = u0 + neuron.a * (neuron.b * v1 - u0);

            if neuron.step(1.0, input) {
                assert_eq!(neuron.v(), neuron.c);
                assert_eq!(neuron.u(), u1 + neuron.d);
            } else {
                assert!(neuron.v() < SPIKE_THRESHOLD_MV);
                assert_eq!(neuron.u(), u1);
            }
        }
    }

    #[test]
    fn test_deterministic_runs() {
        let run = || {
            let mut neuron = IzhikevichNeuron::new(NeuronParams::MOTION);
            (0..500_i32)
                .map(|i| {
                    let fired = neuron.step(1.0, f64::from(i % 7) * 3.0);
                    (neuron.v().to_bits(), neuron.u().to_bits(), fired)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reset_restores_rest() {
        let mut neuron = IzhikevichNeuron::new(NeuronParams::PRESSURE);
        for _ in 0..50 {
            neuron.step(1.0, 12.0);
        }
        neuron.reset();
        assert_eq!(neuron.state(), NeuronParams::PRESSURE.initial_state());
    }
}
