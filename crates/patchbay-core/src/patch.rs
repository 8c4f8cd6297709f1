//! Patch points: the single reference a sink holds to its upstream source.
//!
//! A [`Jack`] is the "sink reads from source" edge of the patch graph. The
//! control thread patches and unpatches by replacing one `Arc` in an
//! [`ArcSwapOption`]; the render thread loads it without locking and sees
//! either the old or the new source for the whole pull, never a torn value.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::kernels::fill;
use crate::node::{AudioNode, RenderContext, RenderStatus, SharedNode};

/// An input that can be patched to one upstream node.
#[derive(Default)]
pub struct Jack {
    // `ArcSwap` needs a sized pointee, hence the extra `Arc` around the
    // trait object.
    source: ArcSwapOption<SharedNode>,
}

impl Jack {
    /// Creates an unpatched jack.
    pub fn new() -> Self {
        Self {
            source: ArcSwapOption::empty(),
        }
    }

    /// Patches `node` into this jack, replacing any previous source.
    pub fn connect(&self, node: SharedNode) {
        #[cfg(feature = "tracing")]
        tracing::debug!("patch_connect: {}", node.label());
        self.source.store(Some(Arc::new(node)));
    }

    /// Removes the current source. Returns true if something was patched.
    pub fn disconnect(&self) -> bool {
        let previous = self.source.swap(None);
        #[cfg(feature = "tracing")]
        if let Some(node) = previous.as_ref() {
            tracing::debug!("patch_disconnect: {}", node.label());
        }
        previous.is_some()
    }

    /// Returns true if a source is patched.
    pub fn is_connected(&self) -> bool {
        self.source.load().is_some()
    }

    /// Returns a handle to the patched source, if any.
    pub fn source(&self) -> Option<SharedNode> {
        self.source.load().as_ref().map(|node| Arc::clone(&**node))
    }

    /// Pulls the patched source into `out`, or writes silence when unpatched.
    pub fn pull(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        let source = self.source.load();
        match source.as_ref() {
            Some(node) => node.render(out, ctx),
            None => {
                fill(out, 0.0);
                RenderStatus::Silent
            }
        }
    }
}

impl core::fmt::Debug for Jack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let source = self.source.load();
        f.debug_struct("Jack")
            .field("source", &source.as_ref().map(|node| node.label()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::ValueNode;

    #[test]
    fn unpatched_jack_is_silent() {
        let jack = Jack::new();
        let mut buf = [1.0; 8];
        let ctx = RenderContext::new(0, 1, 48000.0);
        assert_eq!(jack.pull(&mut buf, &ctx), RenderStatus::Silent);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn connect_and_disconnect() {
        let jack = Jack::new();
        jack.connect(Arc::new(ValueNode::new(0.25)));
        assert!(jack.is_connected());

        let mut buf = [0.0; 4];
        let ctx = RenderContext::new(0, 1, 48000.0);
        assert_eq!(jack.pull(&mut buf, &ctx), RenderStatus::Rendered);
        assert!(buf.iter().all(|&s| s == 0.25));

        assert!(jack.disconnect());
        assert!(!jack.disconnect());
        assert!(jack.source().is_none());
    }

    #[test]
    fn reconnect_replaces_source() {
        let jack = Jack::new();
        jack.connect(Arc::new(ValueNode::new(0.1)));
        jack.connect(Arc::new(ValueNode::new(0.9)));

        let mut buf = [0.0; 2];
        jack.pull(&mut buf, &RenderContext::new(0, 1, 48000.0));
        assert_eq!(buf, [0.9, 0.9]);
    }
}
