//! Beat clock: converts tempo and swing into step-advance events.
//!
//! The clock is driven from the render callback. Each sample it accumulates
//! phase; when the phase reaches the samples-per-step threshold it fires a
//! step. Swing alternates the threshold between a long on-beat interval and a
//! short off-beat interval, so every pair of steps still spans two straight
//! steps and the tempo is preserved.
//!
//! In master-clock mode with an external source patched in, the internal
//! accumulator is suppressed and steps follow rising edges in the external
//! buffer instead.
//!
//! ```rust
//! use patchbay_core::StepDivision;
//!
//! // 120 BPM, quarter-note steps at 48 kHz: 0.5 s per step
//! let samples = StepDivision::Quarter.samples_per_step(120.0, 48000.0);
//! assert!((samples - 24000.0).abs() < 0.01);
//! ```

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::context::SessionContext;
use crate::error::ControlError;
use crate::guard::CycleGuard;
use crate::kernels::{BinaryState, EdgeDetector, binary_state, fill, fill_frames};
use crate::node::{AudioNode, RenderContext, RenderStatus};
use crate::patch::Jack;
use crate::scratch::ScratchBank;
use crate::shared::AtomicF32;
use crate::trigger::PULSE_FRAMES;

/// How far full swing stretches the on-beat interval, as a fraction of one
/// straight step. Tune this to change the feel of the swing control.
pub const DEFAULT_SWING_DEPTH: f32 = 0.5;

/// Largest accepted swing amount.
pub const MAX_SWING: f32 = 0.95;

/// Beats per measure for the measure-phase readout.
pub const MEASURE_BEATS: f32 = 4.0;

/// Musical length of one sequencer step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepDivision {
    /// Whole note (4 beats)
    Whole,
    /// Half note (2 beats)
    Half,
    /// Quarter note (1 beat)
    #[default]
    Quarter,
    /// Eighth note (1/2 beat)
    Eighth,
    /// Sixteenth note (1/4 beat)
    Sixteenth,
    /// Thirty-second note (1/8 beat)
    ThirtySecond,
}

impl StepDivision {
    /// Every division, longest first.
    pub const ALL: [StepDivision; 6] = [
        StepDivision::Whole,
        StepDivision::Half,
        StepDivision::Quarter,
        StepDivision::Eighth,
        StepDivision::Sixteenth,
        StepDivision::ThirtySecond,
    ];

    /// Looks up the division for a tempo selector (1, 2, 4, 8, 16 or 32).
    pub fn from_selector(selector: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.selector() == selector)
    }

    /// Tempo selector value: the note denominator.
    pub fn selector(self) -> u32 {
        match self {
            StepDivision::Whole => 1,
            StepDivision::Half => 2,
            StepDivision::Quarter => 4,
            StepDivision::Eighth => 8,
            StepDivision::Sixteenth => 16,
            StepDivision::ThirtySecond => 32,
        }
    }

    /// Beats covered by one step.
    pub fn beats(self) -> f32 {
        4.0 / self.selector() as f32
    }

    /// Length of one straight (unswung) step in samples.
    pub fn samples_per_step(self, bpm: f32, sample_rate: f32) -> f32 {
        self.beats() * 60.0 / bpm * sample_rate
    }

    fn index(self) -> u8 {
        match self {
            StepDivision::Whole => 0,
            StepDivision::Half => 1,
            StepDivision::Quarter => 2,
            StepDivision::Eighth => 3,
            StepDivision::Sixteenth => 4,
            StepDivision::ThirtySecond => 5,
        }
    }

    fn from_index(index: u8) -> Self {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .unwrap_or_default()
    }
}

/// Interval until the next step, with swing applied.
///
/// `on_beat` intervals are lengthened by `swing * depth` of a step and off-beat
/// intervals shortened by the same amount.
#[inline]
pub fn swung_interval(straight: f32, swing: f32, depth: f32, on_beat: bool) -> f32 {
    let shift = swing * depth;
    if on_beat {
        straight * (1.0 + shift)
    } else {
        straight * (1.0 - shift)
    }
}

/// Timing inputs for one callback of the internal clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockParams {
    /// Straight step length in samples.
    pub samples_per_step: f32,
    /// Beat length in samples.
    pub samples_per_beat: f32,
    /// Swing amount in `[0, MAX_SWING]`.
    pub swing: f32,
    /// Swing depth, see [`DEFAULT_SWING_DEPTH`].
    pub swing_depth: f32,
}

impl ClockParams {
    /// Computes the parameters for a tempo, division and swing.
    pub fn new(bpm: f32, sample_rate: f32, division: StepDivision, swing: f32) -> Self {
        Self {
            samples_per_step: division.samples_per_step(bpm, sample_rate),
            samples_per_beat: 60.0 / bpm * sample_rate,
            swing,
            swing_depth: DEFAULT_SWING_DEPTH,
        }
    }
}

/// Phase accumulator behind [`ClockNode`]. Owned by the render thread.
#[derive(Debug, Clone)]
pub struct BeatClock {
    /// Samples elapsed since the last step.
    phase: f32,
    /// Interval that must elapse before the next step.
    threshold: f32,
    /// Steps fired since the last reset.
    ticks: u64,
    fire_next: bool,
    /// Position within the measure, in beats.
    measure: f32,
    edges: EdgeDetector,
    pulse_remaining: usize,
}

impl BeatClock {
    /// Creates a clock that fires step 0 on its first sample.
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            threshold: 0.0,
            ticks: 0,
            fire_next: true,
            measure: 0.0,
            edges: EdgeDetector::new(),
            pulse_remaining: 0,
        }
    }

    /// Snaps phase to zero; the next sample fires step 0.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Steps fired since the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Position within the measure, normalized to `[0, 1)`.
    pub fn measure_phase(&self) -> f32 {
        self.measure / MEASURE_BEATS
    }

    /// Advances the internal accumulator by one sample. Returns true if a
    /// step fires on this sample.
    pub fn advance_internal(&mut self, params: &ClockParams) -> bool {
        let fired = if self.fire_next {
            self.fire_next = false;
            true
        } else if self.phase >= self.threshold {
            self.phase -= self.threshold;
            true
        } else {
            false
        };
        if fired {
            self.ticks += 1;
            // ticks is odd right after an even-indexed step fires
            let on_beat = self.ticks % 2 == 1;
            self.threshold = swung_interval(
                params.samples_per_step,
                params.swing,
                params.swing_depth,
                on_beat,
            )
            .max(1.0);
        }
        self.phase += 1.0;
        if params.samples_per_beat > 0.0 {
            self.advance_measure(1.0 / params.samples_per_beat);
        }
        fired
    }

    /// Feeds one sample of an external clock signal. Returns true on a rising
    /// edge; each edge advances the measure by `beats_per_step`.
    pub fn advance_external(&mut self, sample: f32, beats_per_step: f32) -> bool {
        let fired = self.edges.process(sample);
        if fired {
            self.ticks += 1;
            self.advance_measure(beats_per_step);
        }
        fired
    }

    fn advance_measure(&mut self, beats: f32) {
        self.measure += beats;
        if self.measure >= MEASURE_BEATS {
            self.measure = libm::fmodf(self.measure, MEASURE_BEATS);
        }
    }

    /// Output pulse level for the current sample; `fired` starts a new pulse.
    fn pulse(&mut self, fired: bool) -> f32 {
        if fired {
            self.pulse_remaining = PULSE_FRAMES;
        }
        if self.pulse_remaining > 0 {
            self.pulse_remaining -= 1;
            1.0
        } else {
            0.0
        }
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A step event delivered to a [`ClockListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTick {
    /// Zero-based step count since the last reset.
    pub index: u64,
    /// Frame within the callback buffer on which the step fired.
    pub frame: usize,
    /// Timestamp of the callback.
    pub timestamp: u64,
    /// True when the step came from an external clock source.
    pub external: bool,
}

/// Receives clock events on the render thread.
///
/// Implementations must be cheap, allocation-free and non-blocking.
pub trait ClockListener: Send + Sync {
    /// A step fired.
    fn on_step(&self, tick: ClockTick);

    /// The clock was reset; the next step is step 0.
    fn on_reset(&self) {}

    /// Once per callback, with the measure phase in `[0, 1)`.
    fn on_beat(&self, _measure_phase: f32) {}
}

type SharedListener = Arc<dyn ClockListener>;

/// Clock device: a [`BeatClock`] with lock-free controls, an optional
/// external clock input, and a pulse output.
///
/// The output carries a [`PULSE_FRAMES`]-wide pulse at every step, so a clock
/// node can be patched as another clock's external source.
pub struct ClockNode {
    session: Arc<SessionContext>,
    running: AtomicBool,
    division: AtomicU8,
    swing: AtomicF32,
    swing_depth: AtomicF32,
    reset_requested: AtomicBool,
    master_mode: AtomicBool,
    external: Jack,
    listener: ArcSwapOption<SharedListener>,
    ticks: AtomicU64,
    guard: CycleGuard,
    scratch: ScratchBank,
    state: Mutex<BeatClock>,
}

impl ClockNode {
    /// Creates a stopped clock at quarter-note steps with no swing.
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self {
            session,
            running: AtomicBool::new(false),
            division: AtomicU8::new(StepDivision::Quarter.index()),
            swing: AtomicF32::new(0.0),
            swing_depth: AtomicF32::new(DEFAULT_SWING_DEPTH),
            reset_requested: AtomicBool::new(false),
            master_mode: AtomicBool::new(false),
            external: Jack::new(),
            listener: ArcSwapOption::empty(),
            ticks: AtomicU64::new(0),
            guard: CycleGuard::new(),
            scratch: ScratchBank::new(1),
            state: Mutex::new(BeatClock::new()),
        }
    }

    /// Starts or stops the clock. Starting also resets it so the first step
    /// lands on the next callback.
    pub fn toggle_run(&self, run: bool) {
        #[cfg(feature = "tracing")]
        tracing::debug!(run, "clock_toggle_run");
        if run {
            self.reset_requested.store(true, Ordering::Relaxed);
        }
        self.running.store(run, Ordering::Relaxed);
    }

    /// True while the clock is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Requests a reset on the next callback: listeners get `on_reset` and the
    /// phase snaps to zero.
    pub fn reset(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("clock_reset_requested");
        self.reset_requested.store(true, Ordering::Relaxed);
    }

    /// Sets the step division.
    pub fn set_division(&self, division: StepDivision) {
        self.division.store(division.index(), Ordering::Relaxed);
    }

    /// Sets the step division from a tempo selector.
    pub fn set_tempo_selector(&self, selector: u32) -> Result<(), ControlError> {
        let division =
            StepDivision::from_selector(selector).ok_or(ControlError::TempoSelector(selector))?;
        self.set_division(division);
        Ok(())
    }

    /// Current step division.
    pub fn division(&self) -> StepDivision {
        StepDivision::from_index(self.division.load(Ordering::Relaxed))
    }

    /// Sets swing in `[0, MAX_SWING]`. Non-finite values are ignored.
    pub fn set_swing(&self, swing: f32) {
        if swing.is_finite() {
            self.swing.store(swing.clamp(0.0, MAX_SWING));
        }
    }

    /// Current swing amount.
    pub fn swing(&self) -> f32 {
        self.swing.load()
    }

    /// Sets how far full swing shifts a step, in `[0, 1)`.
    pub fn set_swing_depth(&self, depth: f32) {
        if depth.is_finite() {
            self.swing_depth.store(depth.clamp(0.0, 0.99));
        }
    }

    /// Current swing depth.
    pub fn swing_depth(&self) -> f32 {
        self.swing_depth.load()
    }

    /// Enables following the external clock input when one is patched.
    pub fn set_master_mode(&self, enabled: bool) {
        #[cfg(feature = "tracing")]
        tracing::debug!(enabled, "clock_master_mode");
        self.master_mode.store(enabled, Ordering::Relaxed);
    }

    /// True when master-clock mode is enabled.
    pub fn master_mode(&self) -> bool {
        self.master_mode.load(Ordering::Relaxed)
    }

    /// True when steps currently follow the external input.
    pub fn is_external(&self) -> bool {
        self.master_mode() && self.external.is_connected()
    }

    /// External clock input.
    pub fn external(&self) -> &Jack {
        &self.external
    }

    /// Installs the listener that receives step, reset and beat events.
    pub fn set_listener(&self, listener: SharedListener) {
        self.listener.store(Some(Arc::new(listener)));
    }

    /// Removes the listener.
    pub fn clear_listener(&self) {
        self.listener.store(None);
    }

    /// Total steps fired since creation.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Session this clock reads its tempo from.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Notifies the listener of a fired step and returns the output level for
    /// this frame.
    fn emit(
        &self,
        clock: &mut BeatClock,
        listener: Option<&SharedListener>,
        fired: bool,
        frame: usize,
        ctx: &RenderContext,
        external: bool,
    ) -> f32 {
        if fired {
            self.ticks.fetch_add(1, Ordering::Relaxed);
            if let Some(l) = listener {
                l.on_step(ClockTick {
                    index: clock.ticks() - 1,
                    frame,
                    timestamp: ctx.timestamp,
                    external,
                });
            }
        }
        clock.pulse(fired)
    }

    fn params(&self, sample_rate: f32) -> ClockParams {
        let mut params = ClockParams::new(self.session.bpm(), sample_rate, self.division(), self.swing());
        params.swing_depth = self.swing_depth.load();
        params
    }
}

impl AudioNode for ClockNode {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        self.guard.render(out, |token, out| {
            fill(out, 0.0);
            let Some(mut clock) = self.state.try_lock() else {
                return RenderStatus::Silent;
            };
            let listener = self.listener.load();
            let listener = listener.as_deref();

            if self.reset_requested.swap(false, Ordering::Relaxed) {
                clock.reset();
                if let Some(l) = listener {
                    l.on_reset();
                }
            }
            if !self.is_running() {
                return RenderStatus::Silent;
            }

            let frames = ctx.frames(out);
            let external = self.is_external();
            let mut fired_any = false;

            if external {
                let Some(mut lane) = self.scratch.lease(token, 0, out.len()) else {
                    return RenderStatus::Silent;
                };
                self.external.pull(&mut lane, ctx);
                let beats = self.division().beats();
                for frame in 0..frames {
                    let fired = clock.advance_external(lane[frame * ctx.channels], beats);
                    fired_any |= fired;
                    let level = self.emit(&mut clock, listener, fired, frame, ctx, external);
                    fill_frames(out, ctx.channels, frame..frame + 1, level);
                }
            } else {
                let params = self.params(ctx.sample_rate);
                for frame in 0..frames {
                    let fired = clock.advance_internal(&params);
                    fired_any |= fired;
                    let level = self.emit(&mut clock, listener, fired, frame, ctx, external);
                    fill_frames(out, ctx.channels, frame..frame + 1, level);
                }
            }

            if let Some(l) = listener {
                l.on_beat(clock.measure_phase());
            }
            // A pulse begun last callback can spill into this one without a new step.
            if fired_any || binary_state(out, 0.0) != BinaryState::Low {
                RenderStatus::Rendered
            } else {
                RenderStatus::Silent
            }
        })
    }

    fn label(&self) -> &'static str {
        "clock"
    }
}

impl core::fmt::Debug for ClockNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClockNode")
            .field("running", &self.is_running())
            .field("division", &self.division())
            .field("swing", &self.swing())
            .field("master_mode", &self.master_mode())
            .field("external", &self.external)
            .finish_non_exhaustive()
    }
}
