//! Sequencer rows and their patchable outputs.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::guard::CycleGuard;
use crate::node::{AudioNode, RenderContext, RenderStatus, SharedNode};
use crate::nodes::ValueNode;
use crate::patch::Jack;
use crate::trigger::TriggerNode;

/// What a row emits on each step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowMode {
    /// A two-frame pulse on steps whose gate flag is set.
    #[default]
    Trigger,
    /// The step's level, held until the next step.
    Continuous,
}

/// The widget a grid cell shows for its row's mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepWidget {
    /// On/off button bound to the gate flag.
    Toggle,
    /// Dial bound to the level.
    Dial,
}

impl RowMode {
    /// Widget shown for this mode.
    pub fn widget(self) -> StepWidget {
        match self {
            RowMode::Trigger => StepWidget::Toggle,
            RowMode::Continuous => StepWidget::Dial,
        }
    }
}

/// The node patched downstream of a row.
///
/// Its source is the row's trigger or value node depending on the row mode;
/// switching modes swaps that one reference, so sinks patched to the row
/// output never need repatching.
#[derive(Debug, Default)]
pub struct RowOutput {
    source: Jack,
    guard: CycleGuard,
}

impl AudioNode for RowOutput {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        self.guard.render(out, |_, out| self.source.pull(out, ctx))
    }

    fn label(&self) -> &'static str {
        "sequencer_row"
    }
}

/// One sequencer row: mode, mute flag and its two signal primitives.
#[derive(Debug)]
pub struct Row {
    continuous: AtomicBool,
    muted: AtomicBool,
    trigger: Arc<TriggerNode>,
    value: Arc<ValueNode>,
    output: Arc<RowOutput>,
}

impl Row {
    pub(crate) fn new() -> Self {
        let row = Self {
            continuous: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            trigger: Arc::new(TriggerNode::new()),
            value: Arc::new(ValueNode::new(0.0)),
            output: Arc::new(RowOutput::default()),
        };
        row.output.source.connect(row.trigger.clone());
        row
    }

    /// Current mode.
    pub fn mode(&self) -> RowMode {
        if self.continuous.load(Ordering::Relaxed) {
            RowMode::Continuous
        } else {
            RowMode::Trigger
        }
    }

    pub(crate) fn set_mode(&self, mode: RowMode) {
        let source: SharedNode = match mode {
            RowMode::Trigger => self.trigger.clone(),
            RowMode::Continuous => self.value.clone(),
        };
        self.output.source.connect(source);
        self.continuous
            .store(mode == RowMode::Continuous, Ordering::Relaxed);
    }

    /// True when the row skips signal emission.
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Trigger primitive driven in trigger mode.
    pub fn trigger(&self) -> &Arc<TriggerNode> {
        &self.trigger
    }

    /// Value primitive driven in continuous mode.
    pub fn value(&self) -> &Arc<ValueNode> {
        &self.value
    }

    /// Patchable row output.
    pub fn output(&self) -> SharedNode {
        self.output.clone()
    }

    /// Pushes one step's cell into both primitives. The level is remapped
    /// from `[0, 1]` to `[-1, 1]`.
    pub(crate) fn emit(&self, on: bool, level: f32) {
        self.trigger.set_signal(on);
        self.value.set(crate::kernels::unipolar_to_bipolar(level));
    }

    pub(crate) fn reset_outputs(&self) {
        self.trigger.set_signal(false);
        self.value.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(ts: u64) -> RenderContext {
        RenderContext::new(ts, 1, 48000.0)
    }

    #[test]
    fn output_follows_mode() {
        let row = Row::new();
        let output = row.output();
        let mut buf = [0.0; 4];

        row.emit(true, 0.75);
        output.render(&mut buf, &ctx(0));
        assert_eq!(buf, [1.0, 1.0, 0.0, 0.0]);

        row.set_mode(RowMode::Continuous);
        assert_eq!(row.mode(), RowMode::Continuous);
        output.render(&mut buf, &ctx(4));
        assert_eq!(buf, [0.5; 4]);
    }

    #[test]
    fn widgets_match_mode() {
        assert_eq!(RowMode::Trigger.widget(), StepWidget::Toggle);
        assert_eq!(RowMode::Continuous.widget(), StepWidget::Dial);
    }
}
