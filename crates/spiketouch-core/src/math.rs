//! Small numeric helpers shared by the encoder, the synthesizer and the host
//!
//! - [`pointer_speed`]: planar pointer speed from a displacement and interval
//! - [`SpeedAverage`]: fixed-window running mean of recent pointer speeds
//! - [`ramp`]: clamped linear interpolation (speed to volume)
//! - [`NoiseSource`]: deterministic Gaussian noise for grain texture

use core::f64::consts::PI;

use heapless::Deque;

// ============================================================================
// Pointer Kinematics
// ============================================================================

/// Pointer speed in units per second, `sqrt(dx² + dy²) / dt`.
///
/// Returns 0 when `dt_s` is zero, negative or not finite.
#[inline]
#[must_use]
pub fn pointer_speed(dx: f64, dy: f64, dt_s: f64) -> f64 {
    if dt_s <= 0.0 || !dt_s.is_finite() {
        return 0.0;
    }
    libm::sqrt(dx * dx + dy * dy) / dt_s
}

/// Linear map of `x` from `[x0, x1]` onto `[y0, y1]`, clamped at both ends.
#[must_use]
pub fn ramp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x <= x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}

// ============================================================================
// Running Speed Average
// ============================================================================

/// Running mean over the last `N` pointer speed samples.
///
/// Until the window fills, the mean covers only the samples seen so far.
#[derive(Clone, Debug)]
pub struct SpeedAverage<const N: usize> {
    window: Deque<f64, N>,
    sum: f64,
}

impl<const N: usize> SpeedAverage<N> {
    /// Create an empty window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window: Deque::new(),
            sum: 0.0,
        }
    }

    /// Push a sample and return the updated mean.
    pub fn push(&mut self, speed: f64) -> f64 {
        if self.window.is_full() {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
        if self.window.push_back(speed).is_ok() {
            self.sum += speed;
        }
        self.mean()
    }

    /// Current mean, 0 when empty.
    #[inline]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.sum / self.window.len() as f64
        }
    }

    /// Number of samples currently held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True when no samples are held
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}

impl<const N: usize> Default for SpeedAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Noise
// ============================================================================

/// Seeded xorshift64 generator with a Box-Muller Gaussian output.
///
/// Identical seeds produce identical sequences on every platform.
#[derive(Clone, Debug)]
pub struct NoiseSource {
    state: u64,
}

impl NoiseSource {
    /// Create a generator. A zero seed is remapped, xorshift would stay at 0.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Uniform sample in `(0, 1]`.
    pub fn uniform(&mut self) -> f64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        // 53 high bits, shifted off zero so ln() stays finite
        ((self.state >> 11) as f64 + 1.0) / (1u64 << 53) as f64
    }

    /// Standard normal sample.
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.uniform();
        let u2 = self.uniform();
        libm::sqrt(-2.0 * libm::log(u1)) * libm::cos(2.0 * PI * u2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_speed() {
        assert!((pointer_speed(3.0, 4.0, 0.5) - 10.0).abs() < 1e-12);
        assert_eq!(pointer_speed(3.0, 4.0, 0.0), 0.0);
        assert_eq!(pointer_speed(3.0, 4.0, -1.0), 0.0);
        assert_eq!(pointer_speed(3.0, 4.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_ramp_clamps_and_interpolates() {
        assert_eq!(ramp(50.0, 100.0, 5000.0, 0.5, 1.0), 0.5);
        assert_eq!(ramp(9000.0, 100.0, 5000.0, 0.5, 1.0), 1.0);
        let mid = ramp(2550.0, 100.0, 5000.0, 0.5, 1.0);
        assert!((mid - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_speed_average_window() {
        let mut avg = SpeedAverage::<3>::new();
        assert_eq!(avg.mean(), 0.0);
        avg.push(3.0);
        avg.push(6.0);
        assert!((avg.mean() - 4.5).abs() < 1e-12);
        avg.push(9.0);
        // Oldest sample (3.0) falls out
        let mean = avg.push(12.0);
        assert!((mean - 9.0).abs() < 1e-12);
        assert_eq!(avg.len(), 3);

        avg.clear();
        assert!(avg.is_empty());
        assert_eq!(avg.mean(), 0.0);
    }

    #[test]
    fn test_noise_is_deterministic() {
        let mut a = NoiseSource::new(42);
        let mut b = NoiseSource::new(42);
        for _ in 0..100 {
            assert_eq!(a.gaussian().to_bits(), b.gaussian().to_bits());
        }
    }

    #[test]
    fn test_noise_uniform_range() {
        let mut rng = NoiseSource::new(0);
        for _ in 0..1000 {
            let x = rng.uniform();
            assert!(x > 0.0 && x <= 1.0);
        }
    }
}
