//! Per-node recursion limiter that turns patch cycles into silence.
//!
//! End users may patch any output into any input, including a node into its
//! own upstream. Every node with upstream jacks owns a [`CycleGuard`]. Entering
//! a render bumps the node's depth counter; once the counter passes the limit
//! the call is refused, the buffer is zeroed and [`RenderStatus::Blocked`] is
//! returned. The counter is released by [`GuardToken`]'s `Drop`, so it returns
//! to its previous value on every exit path including unwinding.
//!
//! A feedback loop therefore renders at most `limit` nested passes per
//! callback: the work is bounded by `limit × buffer length` per node.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::kernels::fill;
use crate::node::RenderStatus;

/// Highest render depth any node accepts before refusing.
///
/// Scratch banks allocate one lane set per depth level, so a guard's limit can
/// be lowered with [`CycleGuard::with_limit`] but never raised above this.
pub const MAX_RENDER_DEPTH: usize = 4;

/// Render-depth counter for one node.
#[derive(Debug)]
pub struct CycleGuard {
    // Only the render thread touches the counter; the atomic makes the owning
    // node `Sync`, not a synchronisation point.
    depth: AtomicUsize,
    limit: usize,
}

impl CycleGuard {
    /// Creates a guard with the default [`MAX_RENDER_DEPTH`] limit.
    pub const fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
            limit: MAX_RENDER_DEPTH,
        }
    }

    /// Creates a guard with a lower limit (clamped to `1..=MAX_RENDER_DEPTH`).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            depth: AtomicUsize::new(0),
            limit: limit.clamp(1, MAX_RENDER_DEPTH),
        }
    }

    /// Maximum depth this guard admits.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Current nesting depth. Zero whenever no render of the node is in flight.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Enters one render level.
    ///
    /// Returns `None` when the limit is exceeded. The increment is undone in
    /// both cases: immediately on refusal, or when the token drops.
    pub fn enter(&self) -> Option<GuardToken<'_>> {
        let level = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        let token = GuardToken { guard: self, level };
        if level > self.limit {
            None
        } else {
            Some(token)
        }
    }

    /// Runs `render` inside the guard, or zeroes `out` and reports
    /// [`RenderStatus::Blocked`] when the limit is exceeded.
    #[inline]
    pub fn render<F>(&self, out: &mut [f32], render: F) -> RenderStatus
    where
        F: FnOnce(&GuardToken<'_>, &mut [f32]) -> RenderStatus,
    {
        match self.enter() {
            Some(token) => render(&token, out),
            None => {
                fill(out, 0.0);
                RenderStatus::Blocked
            }
        }
    }
}

impl Default for CycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of having entered a [`CycleGuard`]; releases the level on drop.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a CycleGuard,
    level: usize,
}

impl GuardToken<'_> {
    /// One-based nesting level of this render (1 for the outermost call).
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Zero-based index for per-level scratch storage.
    #[inline]
    pub fn lane_set(&self) -> usize {
        self.level - 1
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.depth.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entries_count_up_and_release() {
        let guard = CycleGuard::new();
        {
            let a = guard.enter().unwrap();
            assert_eq!(a.level(), 1);
            let b = guard.enter().unwrap();
            assert_eq!(b.level(), 2);
            assert_eq!(guard.depth(), 2);
        }
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn refuses_past_limit_without_leaking() {
        let guard = CycleGuard::with_limit(2);
        let _a = guard.enter().unwrap();
        let _b = guard.enter().unwrap();
        assert!(guard.enter().is_none());
        assert_eq!(guard.depth(), 2);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(CycleGuard::with_limit(0).limit(), 1);
        assert_eq!(CycleGuard::with_limit(99).limit(), MAX_RENDER_DEPTH);
    }

    #[test]
    fn blocked_render_zeroes_buffer() {
        let guard = CycleGuard::with_limit(1);
        let _outer = guard.enter().unwrap();
        let mut buf = [0.5; 8];
        let status = guard.render(&mut buf, |_, _| RenderStatus::Rendered);
        assert_eq!(status, RenderStatus::Blocked);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn depth_released_when_render_panics() {
        let guard = CycleGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut buf = [0.0; 4];
            guard.render(&mut buf, |_, _| panic!("inner render failed"));
        }));
        assert!(result.is_err());
        assert_eq!(guard.depth(), 0);
    }
}
