//! Sample-accurate trigger and gate sources.
//!
//! The control thread never writes into a render buffer. It *arms* an edge with
//! [`TriggerNode::set_signal`]; the next render stamps the edge with its
//! callback timestamp and writes the pulse, and the first render with a later
//! timestamp retires it.
//!
//! Edge state lives in one `AtomicU64`:
//!
//! | value          | meaning                                    |
//! |----------------|--------------------------------------------|
//! | `IDLE`         | nothing pending                            |
//! | `ARMED`        | armed by the control thread, not yet seen  |
//! | any timestamp  | fired during the callback with that stamp  |
//!
//! Arming is a single store and retiring is a compare-exchange from the stamp
//! back to `IDLE`, so an edge armed while the previous one is being retired is
//! never lost.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::MAX_BLOCK_SAMPLES;
use crate::kernels::fill_frames;
use crate::node::{AudioNode, RenderContext, RenderStatus};

/// Width of a trigger pulse in frames.
///
/// Two frames give downstream edge detectors a full rise followed by a held
/// sample, and the fall arrives on frame 2.
pub const PULSE_FRAMES: usize = 2;

const IDLE: u64 = u64::MAX;
const ARMED: u64 = u64::MAX - 1;

/// Outcome of consulting the edge state at the start of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgePhase {
    Idle,
    /// The edge belongs to this callback. `fresh` is true on the render that
    /// stamped it.
    Firing { fresh: bool },
    Retired,
}

#[derive(Debug)]
struct EdgeCell(AtomicU64);

impl EdgeCell {
    const fn new() -> Self {
        Self(AtomicU64::new(IDLE))
    }

    fn arm(&self) {
        self.0.store(ARMED, Ordering::Release);
    }

    fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire) != IDLE
    }

    fn observe(&self, timestamp: u64) -> EdgePhase {
        match self.0.load(Ordering::Acquire) {
            IDLE => EdgePhase::Idle,
            ARMED => {
                match self
                    .0
                    .compare_exchange(ARMED, timestamp, Ordering::AcqRel, Ordering::Acquire)
                {
                    Ok(_) => EdgePhase::Firing { fresh: true },
                    Err(now) if now == timestamp => EdgePhase::Firing { fresh: false },
                    Err(_) => EdgePhase::Idle,
                }
            }
            stamp if stamp == timestamp => EdgePhase::Firing { fresh: false },
            stamp => {
                // A failed exchange means the control thread re-armed in the
                // meantime; that edge fires on the next callback.
                let _ = self
                    .0
                    .compare_exchange(stamp, IDLE, Ordering::AcqRel, Ordering::Acquire);
                EdgePhase::Retired
            }
        }
    }
}

/// One-shot pulse source driven from the control thread.
///
/// `set_signal(true)` produces a [`PULSE_FRAMES`]-wide pulse of `1.0` at the
/// start of the next callback; `set_signal(false)` arms an edge that renders
/// silence. Calling it repeatedly before the render still yields one pulse.
/// Rendering twice with the same timestamp (fan-out) produces the same buffer
/// twice, not a second edge.
#[derive(Debug)]
pub struct TriggerNode {
    level: AtomicBool,
    edge: EdgeCell,
}

impl TriggerNode {
    /// Creates an idle trigger.
    pub const fn new() -> Self {
        Self {
            level: AtomicBool::new(false),
            edge: EdgeCell::new(),
        }
    }

    /// Arms an edge at `on` for the next render.
    pub fn set_signal(&self, on: bool) {
        self.level.store(on, Ordering::Relaxed);
        self.edge.arm();
    }

    /// True while an edge is armed or still being rendered.
    pub fn is_pending(&self) -> bool {
        self.edge.is_pending()
    }

    /// Level of the most recently armed edge.
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }
}

impl Default for TriggerNode {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for TriggerNode {
    /// Emits the armed edge as a pulse at the start of `out`.
    ///
    /// A second render at the same `ctx.timestamp` writes the identical
    /// buffer and does not count a new edge.
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        out.fill(0.0);
        match self.edge.observe(ctx.timestamp) {
            EdgePhase::Firing { .. } if self.level() => {
                fill_frames(out, ctx.channels, 0..PULSE_FRAMES, 1.0);
                RenderStatus::Rendered
            }
            _ => RenderStatus::Silent,
        }
    }

    fn label(&self) -> &'static str {
        "trigger"
    }
}

/// Level-held gate.
///
/// The buffer holds `1.0` while the gate is high and `0.0` while low. Arming a
/// high edge while the gate was already high writes a single low sample at the
/// start of the next callback, so a downstream edge detector sees a fresh rise
/// for every step, including back-to-back ones.
#[derive(Debug)]
pub struct GateNode {
    level: AtomicBool,
    edge: EdgeCell,
    // Render-thread-only bookkeeping.
    rendered_high: AtomicBool,
    retrigger: AtomicBool,
}

impl GateNode {
    /// Creates a closed gate.
    pub const fn new() -> Self {
        Self {
            level: AtomicBool::new(false),
            edge: EdgeCell::new(),
            rendered_high: AtomicBool::new(false),
            retrigger: AtomicBool::new(false),
        }
    }

    /// Opens or closes the gate from the next callback on.
    pub fn set_signal(&self, on: bool) {
        self.level.store(on, Ordering::Relaxed);
        self.edge.arm();
    }

    /// Current gate level.
    pub fn is_open(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }
}

impl Default for GateNode {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for GateNode {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        let high = self.is_open();
        match self.edge.observe(ctx.timestamp) {
            EdgePhase::Firing { fresh: true } => {
                let was_high = self.rendered_high.load(Ordering::Relaxed);
                self.retrigger.store(was_high && high, Ordering::Relaxed);
            }
            EdgePhase::Firing { fresh: false } => {}
            EdgePhase::Idle | EdgePhase::Retired => self.retrigger.store(false, Ordering::Relaxed),
        }

        out.fill(if high { 1.0 } else { 0.0 });
        if high && self.retrigger.load(Ordering::Relaxed) {
            fill_frames(out, ctx.channels, 0..1, 0.0);
        }
        self.rendered_high.store(high, Ordering::Relaxed);

        if high {
            RenderStatus::Rendered
        } else {
            RenderStatus::Silent
        }
    }

    fn label(&self) -> &'static str {
        "gate"
    }
}

struct CacheSlot {
    valid: bool,
    timestamp: u64,
    channels: usize,
    len: usize,
    status: RenderStatus,
    buf: Vec<f32>,
}

/// Makes any node idempotent per callback timestamp.
///
/// The first render at a timestamp runs the inner node and keeps a copy of the
/// buffer; later renders at the same timestamp and buffer shape copy the cached
/// buffer out without touching the inner node. The cache lock is never held
/// while the inner node renders, so a feedback path that re-enters the wrapper
/// simply misses the cache.
pub struct Memoized<N> {
    inner: N,
    cache: Mutex<CacheSlot>,
}

impl<N: AudioNode> Memoized<N> {
    /// Wraps `inner` with an empty single-slot cache.
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            cache: Mutex::new(CacheSlot {
                valid: false,
                timestamp: 0,
                channels: 0,
                len: 0,
                status: RenderStatus::Silent,
                buf: vec![0.0; MAX_BLOCK_SAMPLES],
            }),
        }
    }

    /// The wrapped node.
    pub fn inner(&self) -> &N {
        &self.inner
    }

    /// Drops the cached buffer.
    pub fn invalidate(&self) {
        if let Some(mut slot) = self.cache.try_lock() {
            slot.valid = false;
        }
    }
}

impl<N: AudioNode> AudioNode for Memoized<N> {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        if let Some(slot) = self.cache.try_lock() {
            if slot.valid
                && slot.timestamp == ctx.timestamp
                && slot.channels == ctx.channels
                && slot.len == out.len()
            {
                out.copy_from_slice(&slot.buf[..slot.len]);
                return slot.status;
            }
        }

        let status = self.inner.render(out, ctx);

        if out.len() <= MAX_BLOCK_SAMPLES {
            if let Some(mut slot) = self.cache.try_lock() {
                slot.buf[..out.len()].copy_from_slice(out);
                slot.valid = true;
                slot.timestamp = ctx.timestamp;
                slot.channels = ctx.channels;
                slot.len = out.len();
                slot.status = status;
            }
        }
        status
    }

    fn label(&self) -> &'static str {
        self.inner.label()
    }
}

impl<N: core::fmt::Debug> core::fmt::Debug for Memoized<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Memoized").field("inner", &self.inner).finish_non_exhaustive()
    }
}

/// Trigger whose output is cached per timestamp for fan-out patches.
pub type CachedTrigger = Memoized<TriggerNode>;

impl CachedTrigger {
    /// Creates an idle cached trigger.
    pub fn trigger() -> Self {
        Memoized::new(TriggerNode::new())
    }

    /// Arms an edge on the wrapped trigger.
    pub fn set_signal(&self, on: bool) {
        self.inner.set_signal(on);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;

    fn ctx(ts: u64) -> RenderContext {
        RenderContext::new(ts, 1, 48000.0)
    }

    fn pulse_count(buf: &[f32]) -> usize {
        let mut prev = 0.0;
        let mut count = 0;
        for &s in buf {
            if s > 0.5 && prev <= 0.5 {
                count += 1;
            }
            prev = s;
        }
        count
    }

    #[test]
    fn idle_trigger_is_silent() {
        let trig = TriggerNode::new();
        let mut buf = [1.0; 8];
        assert_eq!(trig.render(&mut buf, &ctx(0)), RenderStatus::Silent);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn armed_edge_fires_once_two_frames_wide() {
        let trig = TriggerNode::new();
        trig.set_signal(true);
        trig.set_signal(true);
        trig.set_signal(true);

        let mut buf = [0.0; 8];
        assert_eq!(trig.render(&mut buf, &ctx(0)), RenderStatus::Rendered);
        assert_eq!(&buf[..3], &[1.0, 1.0, 0.0]);
        assert!(trig.is_pending());

        assert_eq!(trig.render(&mut buf, &ctx(8)), RenderStatus::Silent);
        assert!(buf.iter().all(|&s| s == 0.0));
        assert!(!trig.is_pending());
    }

    #[test]
    fn pulse_covers_every_channel() {
        let trig = TriggerNode::new();
        trig.set_signal(true);
        let mut buf = [0.0; 8];
        trig.render(&mut buf, &RenderContext::new(0, 2, 48000.0));
        assert_eq!(buf, [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn same_timestamp_render_repeats_buffer() {
        let trig = TriggerNode::new();
        trig.set_signal(true);
        let mut a = [0.0; 8];
        let mut b = [0.0; 8];
        trig.render(&mut a, &ctx(64));
        trig.render(&mut b, &ctx(64));
        assert_eq!(a, b);
        // one edge in total across the callback and the next one
        let mut c = [0.0; 8];
        trig.render(&mut c, &ctx(72));
        assert_eq!(pulse_count(&a) + pulse_count(&c), 1);
    }

    #[test]
    fn false_signal_renders_silence() {
        let trig = TriggerNode::new();
        trig.set_signal(false);
        let mut buf = [0.0; 4];
        assert_eq!(trig.render(&mut buf, &ctx(0)), RenderStatus::Silent);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn rearm_during_retire_is_kept() {
        let trig = TriggerNode::new();
        trig.set_signal(true);
        let mut buf = [0.0; 4];
        trig.render(&mut buf, &ctx(0));
        trig.set_signal(true);
        assert_eq!(trig.render(&mut buf, &ctx(4)), RenderStatus::Rendered);
        assert_eq!(buf[0], 1.0);
    }

    #[test]
    fn gate_holds_level() {
        let gate = GateNode::new();
        let mut buf = [0.0; 4];
        gate.set_signal(true);
        assert_eq!(gate.render(&mut buf, &ctx(0)), RenderStatus::Rendered);
        assert_eq!(buf, [1.0; 4]);
        assert_eq!(gate.render(&mut buf, &ctx(4)), RenderStatus::Rendered);
        assert_eq!(buf, [1.0; 4]);
        gate.set_signal(false);
        assert_eq!(gate.render(&mut buf, &ctx(8)), RenderStatus::Silent);
        assert_eq!(buf, [0.0; 4]);
    }

    #[test]
    fn gate_retrigger_notches_first_sample() {
        let gate = GateNode::new();
        let mut buf = [0.0; 4];
        gate.set_signal(true);
        gate.render(&mut buf, &ctx(0));
        gate.set_signal(true);
        gate.render(&mut buf, &ctx(4));
        assert_eq!(buf, [0.0, 1.0, 1.0, 1.0]);
        // fan-out render at the same timestamp sees the same notch
        gate.render(&mut buf, &ctx(4));
        assert_eq!(buf, [0.0, 1.0, 1.0, 1.0]);
        gate.render(&mut buf, &ctx(8));
        assert_eq!(buf, [1.0; 4]);
    }

    struct Counting {
        calls: AtomicUsize,
    }

    impl AudioNode for Counting {
        fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
            self.calls.fetch_add(1, Ordering::Relaxed);
            out.fill(ctx.timestamp as f32);
            RenderStatus::Rendered
        }
    }

    #[test]
    fn memoized_renders_inner_once_per_timestamp() {
        let node = Memoized::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut buf = [0.0; 4];
        node.render(&mut buf, &ctx(3));
        node.render(&mut buf, &ctx(3));
        assert_eq!(node.inner().calls.load(Ordering::Relaxed), 1);
        assert_eq!(buf, [3.0; 4]);

        node.render(&mut buf, &ctx(7));
        assert_eq!(node.inner().calls.load(Ordering::Relaxed), 2);

        // a different buffer shape misses the cache
        let mut wide = [0.0; 8];
        node.render(&mut wide, &ctx(7));
        assert_eq!(node.inner().calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn memoized_invalidate_forces_render() {
        let node = Memoized::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut buf = [0.0; 4];
        node.render(&mut buf, &ctx(0));
        node.invalidate();
        node.render(&mut buf, &ctx(0));
        assert_eq!(node.inner().calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn cached_trigger_fan_out_matches() {
        let trig = CachedTrigger::trigger();
        trig.set_signal(true);
        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        assert_eq!(trig.render(&mut a, &ctx(10)), RenderStatus::Rendered);
        assert_eq!(trig.render(&mut b, &ctx(10)), RenderStatus::Rendered);
        assert_eq!(a, b);
        assert_eq!(pulse_count(&a), 1);
    }
}
