//! One-pole lowpass used to smooth clip playback output.
//!
//! Each sample moves the state toward the input by `1 - coeff`:
//!
//! ```text
//! state = x + coeff * (state - x),   coeff = exp(-2π f / fs)
//! ```
//!
//! The clip player keeps one filter per output channel and carries its state
//! across callbacks, so jumps in playback position (loop wraps, scrub moves,
//! sequence restarts) are rounded off instead of clicking.
//!
//! ```rust
//! use patchbay_core::OnePole;
//!
//! let mut smoother = OnePole::new(48000.0, 4000.0);
//! let first = smoother.process(1.0);
//! assert!(first > 0.0 && first < 1.0);
//! ```

use libm::expf;

/// Flushes values too small to matter to zero so the feedback path never
/// settles into denormals.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// 6 dB/oct smoothing filter for one channel.
///
/// # Invariants
///
/// - `coeff` is always in `[0, 1)`
/// - `state` is finite; a non-finite input leaves it unchanged
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Creates a filter with cutoff `freq_hz`, clamped below Nyquist.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate: sample_rate.max(1.0),
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Sets the cutoff frequency.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if input.is_finite() {
            self.state = flush_denormal(input + self.coeff * (self.state - input));
        }
        self.state
    }

    /// Last output sample.
    #[inline]
    pub fn last(&self) -> f32 {
        self.state
    }

    /// Clears the filter memory.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    fn recalculate_coeff(&mut self) {
        let nyquist = self.sample_rate * 0.5;
        let freq = if self.freq.is_finite() {
            self.freq.clamp(1.0, nyquist)
        } else {
            nyquist
        };
        self.freq = freq;
        self.coeff = expf(-core::f32::consts::TAU * freq / self.sample_rate).min(0.999_999);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4, "DC should pass, got {out}");
    }

    #[test]
    fn smooths_step() {
        let mut lp = OnePole::new(48000.0, 2000.0);
        let first = lp.process(1.0);
        assert!(first > 0.0 && first < 1.0);
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.process(0.5);
        let before = lp.last();
        assert_eq!(lp.process(f32::NAN), before);
        assert_eq!(lp.process(f32::INFINITY), before);
        assert_eq!(lp.last(), before);
    }

    #[test]
    fn cutoff_clamped_to_nyquist() {
        let lp = OnePole::new(48000.0, 1.0e9);
        assert_eq!(lp.frequency(), 24000.0);
    }
}
