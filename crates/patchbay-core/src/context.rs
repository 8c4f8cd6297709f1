//! Session-wide settings shared by every device in a patch.
//!
//! There is no global clock manager: a [`SessionContext`] is constructed by
//! the host and handed (as an `Arc`) to the components that need the sample
//! rate or master tempo.

use crate::MAX_BLOCK_SAMPLES;
use crate::shared::AtomicF32;

/// Default master tempo in beats per minute.
pub const DEFAULT_BPM: f32 = 120.0;

/// Lowest accepted tempo.
pub const MIN_BPM: f32 = 20.0;

/// Highest accepted tempo.
pub const MAX_BPM: f32 = 300.0;

/// Sample rate, master tempo and block limit for one engine instance.
#[derive(Debug)]
pub struct SessionContext {
    sample_rate: f32,
    bpm: AtomicF32,
    max_block_samples: usize,
}

impl SessionContext {
    /// Creates a context at `sample_rate` with the default tempo.
    ///
    /// Non-positive or non-finite rates fall back to 48 kHz.
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            48_000.0
        };
        Self {
            sample_rate,
            bpm: AtomicF32::new(DEFAULT_BPM),
            max_block_samples: MAX_BLOCK_SAMPLES,
        }
    }

    /// Builder-style tempo override.
    pub fn with_bpm(self, bpm: f32) -> Self {
        self.set_bpm(bpm);
        self
    }

    /// Engine sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Master tempo in BPM.
    #[inline]
    pub fn bpm(&self) -> f32 {
        self.bpm.load()
    }

    /// Sets the master tempo, clamped to `[MIN_BPM, MAX_BPM]`. Non-finite
    /// values are ignored.
    pub fn set_bpm(&self, bpm: f32) {
        if bpm.is_finite() {
            self.bpm.store(bpm.clamp(MIN_BPM, MAX_BPM));
        }
    }

    /// Largest interleaved buffer a single pull may request.
    #[inline]
    pub fn max_block_samples(&self) -> usize {
        self.max_block_samples
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_is_clamped_and_nan_ignored() {
        let ctx = SessionContext::new(44_100.0);
        ctx.set_bpm(1000.0);
        assert_eq!(ctx.bpm(), MAX_BPM);
        ctx.set_bpm(f32::NAN);
        assert_eq!(ctx.bpm(), MAX_BPM);
        ctx.set_bpm(5.0);
        assert_eq!(ctx.bpm(), MIN_BPM);
    }

    #[test]
    fn bad_sample_rate_falls_back() {
        assert_eq!(SessionContext::new(0.0).sample_rate(), 48_000.0);
        assert_eq!(SessionContext::new(f32::NAN).sample_rate(), 48_000.0);
    }
}
