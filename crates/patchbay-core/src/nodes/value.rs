//! Constant-level sources: a settable value and a fixed constant.

use crate::kernels::fill;
use crate::node::{AudioNode, RenderContext, RenderStatus};
use crate::shared::AtomicF32;

/// Holds one float and renders it as a constant buffer.
///
/// Used as the continuous output of a sequencer row, and anywhere a patch
/// needs a settable control level.
#[derive(Debug, Default)]
pub struct ValueNode {
    value: AtomicF32,
}

impl ValueNode {
    /// Creates a node holding `value` (non-finite values become 0).
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(if value.is_finite() { value } else { 0.0 }),
        }
    }

    /// Sets the output level. Non-finite values are ignored.
    pub fn set(&self, value: f32) {
        if value.is_finite() {
            self.value.store(value);
        }
    }

    /// Current output level.
    pub fn get(&self) -> f32 {
        self.value.load()
    }
}

impl AudioNode for ValueNode {
    fn render(&self, out: &mut [f32], _ctx: &RenderContext) -> RenderStatus {
        fill(out, self.value.load());
        RenderStatus::Rendered
    }

    fn label(&self) -> &'static str {
        "value"
    }
}

/// A level fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantNode(f32);

impl ConstantNode {
    /// Creates a constant source (non-finite values become 0).
    pub fn new(value: f32) -> Self {
        Self(if value.is_finite() { value } else { 0.0 })
    }

    /// The constant.
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl AudioNode for ConstantNode {
    fn render(&self, out: &mut [f32], _ctx: &RenderContext) -> RenderStatus {
        fill(out, self.0);
        if self.0 == 0.0 {
            RenderStatus::Silent
        } else {
            RenderStatus::Rendered
        }
    }

    fn label(&self) -> &'static str {
        "constant"
    }
}
