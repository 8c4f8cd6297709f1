//! Host-side render loop.
//!
//! The [`Engine`] is what the audio callback talks to. Each callback it
//! renders the driver nodes (clocks) so their step events land before the
//! graph is pulled, then pulls the root jack into the output buffer, then
//! advances the logical timestamp by the number of frames rendered.
//!
//! A driver that is also patched into the graph would be rendered twice per
//! callback; wrap such nodes in [`Memoized`](crate::Memoized) so the second
//! pull replays the first.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::MAX_BLOCK_SAMPLES;
use crate::context::SessionContext;
use crate::node::{RenderContext, RenderStatus, SharedNode};
use crate::patch::Jack;

/// Owns the root jack, the driver list and the timestamp.
pub struct Engine {
    session: Arc<SessionContext>,
    root: Jack,
    drivers: ArcSwap<Vec<SharedNode>>,
    frames_rendered: AtomicU64,
    driver_scratch: Mutex<Vec<f32>>,
}

impl Engine {
    /// Creates an engine with nothing patched.
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self {
            session,
            root: Jack::new(),
            drivers: ArcSwap::from_pointee(Vec::new()),
            frames_rendered: AtomicU64::new(0),
            driver_scratch: Mutex::new(vec![0.0; MAX_BLOCK_SAMPLES]),
        }
    }

    /// Session settings.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// The jack feeding the output buffer.
    pub fn root(&self) -> &Jack {
        &self.root
    }

    /// Patches `node` as the output.
    pub fn connect_root(&self, node: SharedNode) {
        self.root.connect(node);
    }

    /// Adds a node rendered every callback before the root is pulled.
    pub fn add_driver(&self, node: SharedNode) {
        #[cfg(feature = "tracing")]
        tracing::debug!("engine_add_driver: {}", node.label());
        self.drivers.rcu(|drivers| {
            let mut next = Vec::clone(drivers);
            next.push(Arc::clone(&node));
            next
        });
    }

    /// Removes every driver.
    pub fn clear_drivers(&self) {
        self.drivers.store(Arc::new(Vec::new()));
    }

    /// Number of drivers.
    pub fn driver_count(&self) -> usize {
        self.drivers.load().len()
    }

    /// Total frames rendered: the timestamp of the next callback.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    /// Renders one host callback into `out`, interleaved over `channels`.
    ///
    /// Buffers longer than [`MAX_BLOCK_SAMPLES`] are split into blocks, each
    /// rendered with its own timestamp.
    pub fn render(&self, out: &mut [f32], channels: usize) -> RenderStatus {
        let channels = channels.max(1);
        let block_len = (MAX_BLOCK_SAMPLES / channels).max(1) * channels;
        let sample_rate = self.session.sample_rate();
        let mut status = RenderStatus::Silent;

        for block in out.chunks_mut(block_len) {
            let timestamp = self.frames_rendered.load(Ordering::Relaxed);
            let ctx = RenderContext::new(timestamp, channels, sample_rate);

            if let Some(mut scratch) = self.driver_scratch.try_lock() {
                if let Some(buf) = scratch.get_mut(..block.len()) {
                    for driver in self.drivers.load().iter() {
                        driver.render(buf, &ctx);
                    }
                }
            }

            status = status.merge(self.root.pull(block, &ctx));
            self.frames_rendered
                .fetch_add((block.len() / channels) as u64, Ordering::Relaxed);
        }
        status
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("drivers", &self.driver_count())
            .field("frames_rendered", &self.frames_rendered())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::ValueNode;

    #[test]
    fn timestamp_counts_frames() {
        let engine = Engine::new(Arc::new(SessionContext::new(48000.0)));
        let mut buf = vec![0.0; 512];
        engine.render(&mut buf, 2);
        assert_eq!(engine.frames_rendered(), 256);
        engine.render(&mut buf, 1);
        assert_eq!(engine.frames_rendered(), 768);
    }

    #[test]
    fn long_buffers_are_split() {
        let engine = Engine::new(Arc::new(SessionContext::default()));
        engine.connect_root(Arc::new(ValueNode::new(0.5)));
        let mut buf = vec![0.0; MAX_BLOCK_SAMPLES * 2 + 10];
        assert_eq!(engine.render(&mut buf, 1), RenderStatus::Rendered);
        assert!(buf.iter().all(|&s| s == 0.5));
        assert_eq!(engine.frames_rendered(), buf.len() as u64);
    }

    #[test]
    fn unpatched_root_is_silent() {
        let engine = Engine::new(Arc::new(SessionContext::default()));
        let mut buf = vec![1.0; 64];
        assert_eq!(engine.render(&mut buf, 2), RenderStatus::Silent);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn drivers_can_be_added_and_cleared() {
        let engine = Engine::new(Arc::new(SessionContext::default()));
        engine.add_driver(Arc::new(ValueNode::new(1.0)));
        engine.add_driver(Arc::new(ValueNode::new(2.0)));
        assert_eq!(engine.driver_count(), 2);
        engine.clear_drivers();
        assert_eq!(engine.driver_count(), 0);
    }
}
