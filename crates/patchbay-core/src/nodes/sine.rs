//! Free-running sine oscillator.

use core::f32::consts::TAU;

use libm::sinf;
use parking_lot::Mutex;

use crate::node::{AudioNode, RenderContext, RenderStatus};
use crate::shared::AtomicF32;

/// Free-running sine oscillator.
///
/// Phase advances on every render call. Patch it through a
/// [`Memoized`](crate::Memoized) wrapper when it feeds more than one sink, or
/// each pull will advance the phase again.
#[derive(Debug)]
pub struct SineNode {
    frequency: AtomicF32,
    amplitude: AtomicF32,
    /// Phase in cycles, `[0, 1)`.
    phase: Mutex<f32>,
}

impl SineNode {
    /// Creates an oscillator at `frequency` Hz with unit amplitude.
    pub fn new(frequency: f32) -> Self {
        let node = Self {
            frequency: AtomicF32::new(0.0),
            amplitude: AtomicF32::new(1.0),
            phase: Mutex::new(0.0),
        };
        node.set_frequency(frequency);
        node
    }

    /// Sets the frequency in Hz. Non-finite values are ignored.
    pub fn set_frequency(&self, frequency: f32) {
        if frequency.is_finite() {
            self.frequency.store(frequency);
        }
    }

    /// Sets the peak amplitude. Non-finite values are ignored.
    pub fn set_amplitude(&self, amplitude: f32) {
        if amplitude.is_finite() {
            self.amplitude.store(amplitude);
        }
    }
}

impl AudioNode for SineNode {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        let Some(mut phase) = self.phase.try_lock() else {
            out.fill(0.0);
            return RenderStatus::Silent;
        };
        let inc = self.frequency.load() / ctx.sample_rate;
        let amp = self.amplitude.load();
        for frame in out.chunks_exact_mut(ctx.channels) {
            frame.fill(amp * sinf(TAU * *phase));
            *phase += inc;
            *phase -= libm::floorf(*phase);
        }
        RenderStatus::Rendered
    }

    fn label(&self) -> &'static str {
        "sine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_cycle_reaches_peak() {
        let sine = SineNode::new(12000.0);
        let mut buf = [0.0; 4];
        sine.render(&mut buf, &RenderContext::new(0, 1, 48000.0));
        assert!(buf[0].abs() < 1e-6);
        assert!((buf[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stereo_frames_share_value() {
        let sine = SineNode::new(440.0);
        sine.set_amplitude(0.5);
        let mut buf = [0.0; 8];
        sine.render(&mut buf, &RenderContext::new(0, 2, 48000.0));
        for frame in buf.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
            assert!(frame[0].abs() <= 0.5);
        }
    }
}
