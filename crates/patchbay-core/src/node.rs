//! The render contract shared by every node in a patch.
//!
//! A patch is a pull graph: the host asks the root node for a buffer, and each
//! node asks its upstream jacks for theirs before writing its own output. Nodes
//! are shared behind `Arc` so one source can feed many sinks (fan-out), which
//! means [`AudioNode::render`] takes `&self`. Parameters live in atomics that
//! the control thread writes without locking; per-render state lives behind
//! `try_lock` cells so the render thread never blocks.

use std::sync::Arc;

/// Per-callback information handed to every node during a pull.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderContext {
    /// Logical timestamp: total frames rendered before this callback.
    pub timestamp: u64,
    /// Number of interleaved channels in the buffer.
    pub channels: usize,
    /// Engine sample rate in Hz.
    pub sample_rate: f32,
}

impl RenderContext {
    /// Creates a context. A channel count of zero is treated as mono.
    pub fn new(timestamp: u64, channels: usize, sample_rate: f32) -> Self {
        Self {
            timestamp,
            channels: channels.max(1),
            sample_rate,
        }
    }

    /// Number of whole frames held by an interleaved buffer.
    #[inline]
    pub fn frames(&self, buffer: &[f32]) -> usize {
        buffer.len() / self.channels
    }
}

/// Outcome of a single render call.
///
/// None of these is an error: a node that cannot produce signal leaves the
/// buffer silent and says why.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// The buffer holds freshly rendered signal.
    Rendered,
    /// The buffer is silent for a normal reason (nothing patched, clip not
    /// loaded, transport stopped, no pending edge).
    Silent,
    /// The cycle guard refused the call; the buffer was zeroed.
    Blocked,
}

impl RenderStatus {
    /// Returns true if the cycle guard refused this render.
    #[inline]
    pub fn is_blocked(self) -> bool {
        self == RenderStatus::Blocked
    }

    /// Combines the status of two upstream pulls into one summary.
    ///
    /// Any rendered input makes the mix rendered; otherwise a blocked input
    /// wins over a silent one so callers can see that a cycle was cut.
    pub fn merge(self, other: RenderStatus) -> RenderStatus {
        match (self, other) {
            (RenderStatus::Rendered, _) | (_, RenderStatus::Rendered) => RenderStatus::Rendered,
            (RenderStatus::Blocked, _) | (_, RenderStatus::Blocked) => RenderStatus::Blocked,
            _ => RenderStatus::Silent,
        }
    }
}

/// A unit that renders an interleaved audio buffer on demand.
///
/// Implementations must be allocation-free and non-blocking inside `render`.
/// Nodes that pull from upstream jacks wrap their work in a
/// [`CycleGuard`](crate::CycleGuard) so that feedback patches degrade to
/// silence instead of recursing forever. Leaf nodes with no upstream may
/// render unconditionally.
pub trait AudioNode: Send + Sync {
    /// Fills `out` with `ctx.frames(out)` interleaved frames.
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus;

    /// Short human-readable kind, used in logs and debugging.
    fn label(&self) -> &'static str {
        "node"
    }
}

/// A node shared between the patch graph and the control thread.
pub type SharedNode = Arc<dyn AudioNode>;

/// Wraps a concrete node for use in the patch graph.
pub fn shared<N: AudioNode + 'static>(node: N) -> SharedNode {
    Arc::new(node)
}

impl<N: AudioNode + ?Sized> AudioNode for Arc<N> {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        (**self).render(out, ctx)
    }

    fn label(&self) -> &'static str {
        (**self).label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_channels_is_mono() {
        let ctx = RenderContext::new(0, 0, 48000.0);
        assert_eq!(ctx.channels, 1);
        assert_eq!(ctx.frames(&[0.0; 16]), 16);
    }

    #[test]
    fn frames_ignore_partial_tail() {
        let ctx = RenderContext::new(0, 2, 48000.0);
        assert_eq!(ctx.frames(&[0.0; 7]), 3);
    }

    #[test]
    fn merge_prefers_rendered_then_blocked() {
        use RenderStatus::*;
        assert_eq!(Silent.merge(Rendered), Rendered);
        assert_eq!(Blocked.merge(Rendered), Rendered);
        assert_eq!(Silent.merge(Blocked), Blocked);
        assert_eq!(Silent.merge(Silent), Silent);
    }
}
