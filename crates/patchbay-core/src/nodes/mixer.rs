//! Summing mixer with per-input gain.

use crate::guard::CycleGuard;
use crate::node::{AudioNode, RenderContext, RenderStatus};
use crate::patch::Jack;
use crate::scratch::ScratchBank;
use crate::shared::AtomicF32;

/// Sums a fixed number of inputs, each with its own gain.
///
/// A mixer may be patched into one of its own inputs. The cycle guard then
/// limits the feedback to `limit` nested passes per callback; the innermost
/// pass sees silence on the feedback input.
pub struct MixerNode {
    inputs: Box<[Jack]>,
    gains: Box<[AtomicF32]>,
    guard: CycleGuard,
    scratch: ScratchBank,
}

impl MixerNode {
    /// Creates a mixer with `inputs` unpatched inputs at unit gain.
    pub fn new(inputs: usize) -> Self {
        Self::with_guard(inputs, CycleGuard::new())
    }

    /// Creates a mixer whose cycle guard admits at most `limit` nested renders.
    pub fn with_depth_limit(inputs: usize, limit: usize) -> Self {
        Self::with_guard(inputs, CycleGuard::with_limit(limit))
    }

    fn with_guard(inputs: usize, guard: CycleGuard) -> Self {
        Self {
            inputs: (0..inputs).map(|_| Jack::new()).collect(),
            gains: (0..inputs).map(|_| AtomicF32::new(1.0)).collect(),
            guard,
            scratch: ScratchBank::new(1),
        }
    }

    /// Number of inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Input jack `index`.
    pub fn input(&self, index: usize) -> Option<&Jack> {
        self.inputs.get(index)
    }

    /// Sets the gain of input `index`. Returns false if the index does not
    /// exist or the gain is not finite.
    pub fn set_gain(&self, index: usize, gain: f32) -> bool {
        match self.gains.get(index) {
            Some(cell) if gain.is_finite() => {
                cell.store(gain);
                true
            }
            _ => false,
        }
    }

    /// Gain of input `index`.
    pub fn gain(&self, index: usize) -> Option<f32> {
        self.gains.get(index).map(AtomicF32::load)
    }

    /// Depth of the render in flight, 0 when idle.
    pub fn render_depth(&self) -> usize {
        self.guard.depth()
    }
}

impl AudioNode for MixerNode {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        self.guard.render(out, |token, out| {
            out.fill(0.0);
            let Some(mut lane) = self.scratch.lease(token, 0, out.len()) else {
                return RenderStatus::Silent;
            };
            let mut status = RenderStatus::Silent;
            for (jack, gain) in self.inputs.iter().zip(self.gains.iter()) {
                if !jack.is_connected() {
                    continue;
                }
                status = status.merge(jack.pull(&mut lane, ctx));
                let gain = gain.load();
                for (o, &i) in out.iter_mut().zip(lane.iter()) {
                    *o += i * gain;
                }
            }
            status
        })
    }

    fn label(&self) -> &'static str {
        "mixer"
    }
}

impl core::fmt::Debug for MixerNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MixerNode")
            .field("inputs", &self.inputs)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::nodes::ValueNode;

    #[test]
    fn sums_inputs_with_gain() {
        let mixer = MixerNode::new(2);
        mixer.input(0).unwrap().connect(Arc::new(ValueNode::new(0.5)));
        mixer.input(1).unwrap().connect(Arc::new(ValueNode::new(0.25)));
        assert!(mixer.set_gain(1, 2.0));
        assert!(!mixer.set_gain(5, 1.0));
        assert!(!mixer.set_gain(0, f32::NAN));

        let mut buf = [0.0; 4];
        let status = mixer.render(&mut buf, &RenderContext::new(0, 1, 48000.0));
        assert_eq!(status, RenderStatus::Rendered);
        assert_eq!(buf, [1.0; 4]);
    }

    #[test]
    fn empty_mixer_is_silent() {
        let mixer = MixerNode::new(3);
        let mut buf = [0.3; 4];
        assert_eq!(
            mixer.render(&mut buf, &RenderContext::new(0, 1, 48000.0)),
            RenderStatus::Silent
        );
        assert_eq!(buf, [0.0; 4]);
    }

    #[test]
    fn self_feedback_is_bounded_by_guard() {
        let mixer = Arc::new(MixerNode::with_depth_limit(2, 4));
        mixer.input(0).unwrap().connect(Arc::new(ValueNode::new(1.0)));
        mixer.input(1).unwrap().connect(mixer.clone());
        mixer.set_gain(1, 0.5);

        let mut buf = [0.0; 8];
        let status = mixer.render(&mut buf, &RenderContext::new(0, 1, 48000.0));
        assert_eq!(status, RenderStatus::Rendered);
        // 1 + 0.5 * (1 + 0.5 * (1 + 0.5 * 1))
        assert!(buf.iter().all(|&s| (s - 1.875).abs() < 1e-6));
        assert_eq!(mixer.render_depth(), 0);

        // break the Arc cycle
        mixer.input(1).unwrap().disconnect();
    }
}
