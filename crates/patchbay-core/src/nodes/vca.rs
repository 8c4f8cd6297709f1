//! Voltage-controlled amplifier: input scaled by a control lane.

use crate::guard::CycleGuard;
use crate::node::{AudioNode, RenderContext, RenderStatus};
use crate::patch::Jack;
use crate::scratch::ScratchBank;
use crate::shared::AtomicF32;

/// Voltage-controlled amplifier: `input × cv × gain`.
///
/// With nothing patched into `cv` the control level is 1.
pub struct VcaNode {
    input: Jack,
    cv: Jack,
    gain: AtomicF32,
    guard: CycleGuard,
    scratch: ScratchBank,
}

impl VcaNode {
    /// Creates a VCA at unit gain with both jacks unpatched.
    pub fn new() -> Self {
        Self {
            input: Jack::new(),
            cv: Jack::new(),
            gain: AtomicF32::new(1.0),
            guard: CycleGuard::new(),
            scratch: ScratchBank::new(1),
        }
    }

    /// Signal input.
    pub fn input(&self) -> &Jack {
        &self.input
    }

    /// Control input.
    pub fn cv(&self) -> &Jack {
        &self.cv
    }

    /// Sets the output gain. Non-finite values are ignored.
    pub fn set_gain(&self, gain: f32) {
        if gain.is_finite() {
            self.gain.store(gain);
        }
    }
}

impl Default for VcaNode {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for VcaNode {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        self.guard.render(out, |token, out| {
            let status = self.input.pull(out, ctx);
            let gain = self.gain.load();
            if self.cv.is_connected() {
                let Some(mut lane) = self.scratch.lease(token, 0, out.len()) else {
                    out.fill(0.0);
                    return RenderStatus::Silent;
                };
                self.cv.pull(&mut lane, ctx);
                for (o, &c) in out.iter_mut().zip(lane.iter()) {
                    *o *= c * gain;
                }
            } else {
                out.iter_mut().for_each(|o| *o *= gain);
            }
            status
        })
    }

    fn label(&self) -> &'static str {
        "vca"
    }
}

impl core::fmt::Debug for VcaNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VcaNode")
            .field("input", &self.input)
            .field("cv", &self.cv)
            .field("gain", &self.gain.load())
            .finish_non_exhaustive()
    }
}
