//! Clip playback engine.
//!
//! A [`ClipPlayer`] plays an in-memory [`Clip`] at a variable, signed speed
//! between a head and a tail bound. Every parameter is a lock-free cell the
//! control thread may write at any rate; the render thread reads them once per
//! callback.
//!
//! # Modes
//!
//! - **Normal**: the position advances by the effective speed each frame, with
//!   optional looping and window fades near the bounds.
//! - **Scrub**: the position glides from the last scrub point to the new one
//!   across one callback. No looping, no window.
//! - **Turntable**: the position moves by the nudge accumulated since the last
//!   callback, wrapping at the bounds.
//!
//! All modes read with linear interpolation and finish with a per-channel
//! one-pole lowpass whose state carries across callbacks.
//!
//! # Bounds
//!
//! Bounds are normalized (`0..=1` of the clip length) and resolved to frames
//! every callback. A request that violates the padding rules, or a clip too
//! short to hold the padding, keeps the previous bounds. See [`Bounds`].

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use libm::exp2f;
use parking_lot::Mutex;

use crate::context::SessionContext;
use crate::error::ControlError;
use crate::guard::{CycleGuard, GuardToken};
use crate::kernels::{EdgeDetector, bipolar_to_unipolar, interpolate, resample_block};
use crate::node::{AudioNode, RenderContext, RenderStatus};
use crate::one_pole::OnePole;
use crate::patch::Jack;
use crate::scratch::{ScratchBank, ScratchLease};
use crate::shared::{AtomicF32, AtomicF64};

/// Minimum distance between head and tail, in frames. Clips shorter than
/// this never resolve bounds and render silence.
pub const BOUND_PADDING: usize = 1024;

/// Octaves of pitch change per unit of exponential pitch CV.
pub const EXP_PITCH_OCTAVES: f32 = 2.0;

/// Speed added per unit of linear pitch CV.
pub const LIN_PITCH_RANGE: f32 = 1.0;

/// Largest speed magnitude accepted by [`ClipPlayer::set_speed`].
pub const MAX_SPEED: f32 = 8.0;

/// Cutoff of the output smoothing filter.
pub const SMOOTHING_CUTOFF_HZ: f32 = 12_000.0;

/// Output channels that get their own smoothing filter. Further channels are
/// written unfiltered.
pub const MAX_FILTERED_CHANNELS: usize = 8;

const CMD_NONE: u8 = 0;
const CMD_PLAY: u8 = 1;
const CMD_STOP: u8 = 2;

const LANE_BOUND: usize = 0;
const LANE_EXP: usize = 0;
const LANE_LIN: usize = 1;
const LANE_AMP: usize = 2;
const LANE_SEQ: usize = 3;

/// Decoded sample data: interleaved samples plus format.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: f32,
}

impl Clip {
    /// Wraps interleaved `samples`.
    ///
    /// Fails when `channels` is zero, the sample count is not a whole number
    /// of frames, or the sample rate is not a positive finite number.
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: f32) -> Result<Self, ControlError> {
        if channels == 0 {
            return Err(ControlError::invalid_clip("zero channels"));
        }
        if samples.len() % channels != 0 {
            return Err(ControlError::invalid_clip(format!(
                "{} samples is not a whole number of {channels}-channel frames",
                samples.len()
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ControlError::invalid_clip(format!(
                "sample rate {sample_rate}"
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Length in frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }
}

/// Resolved playback bounds in frames.
///
/// Always satisfies `0 <= head < tail <= frames` and
/// `head <= tail - BOUND_PADDING`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    head: f64,
    tail: f64,
}

impl Bounds {
    /// Resolves normalized bounds against a clip of `frames` frames.
    ///
    /// Returns `None` for non-finite input, a clip shorter than
    /// [`BOUND_PADDING`], `head` outside `[0, frames - padding)`, `tail`
    /// outside `(0, frames]`, or `head > tail - padding`.
    pub fn resolve(head: f32, tail: f32, frames: usize) -> Option<Bounds> {
        if !(head.is_finite() && tail.is_finite()) || frames < BOUND_PADDING {
            return None;
        }
        let n = frames as f64;
        let pad = BOUND_PADDING as f64;
        let head = f64::from(head) * n;
        let tail = f64::from(tail) * n;
        let head_ok = head >= 0.0 && head < n - pad;
        let tail_ok = tail > 0.0 && tail <= n;
        (head_ok && tail_ok && head <= tail - pad).then_some(Bounds { head, tail })
    }

    /// Bounds covering the whole clip.
    pub fn full(frames: usize) -> Option<Bounds> {
        Self::resolve(0.0, 1.0, frames)
    }

    /// First playable frame.
    pub fn head(&self) -> f64 {
        self.head
    }

    /// End of the playable range (exclusive).
    pub fn tail(&self) -> f64 {
        self.tail
    }

    /// Length of the playable range in frames.
    pub fn span(&self) -> f64 {
        self.tail - self.head
    }

    /// True if `position` lies in `[head, tail)`.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.head && position < self.tail
    }

    /// Wraps `position` into `[head, tail)`.
    pub fn wrap(&self, position: f64) -> f64 {
        let wrapped = self.head + (position - self.head).rem_euclid(self.span());
        // rem_euclid can round up to exactly `span`
        if wrapped >= self.tail { self.head } else { wrapped }
    }

    /// Where playback starts in the given direction.
    pub fn start(&self, reverse: bool) -> f64 {
        if reverse {
            (self.tail - 1.0).max(self.head)
        } else {
            self.head
        }
    }

    /// Fade gain for `position` with a window of `window` frames: rises from
    /// 0 at either bound to 1 at `window` frames inside.
    pub fn window_gain(&self, position: f64, window: usize) -> f32 {
        if window == 0 {
            return 1.0;
        }
        let distance = (position - self.head).min(self.tail - position);
        (distance / window as f64).clamp(0.0, 1.0) as f32
    }
}

/// Receives play/stop transitions on the render thread.
pub trait PlaybackObserver: Send + Sync {
    /// Playback started (`true`) or stopped (`false`).
    fn on_play_state(&self, playing: bool);
}

type SharedObserver = Arc<dyn PlaybackObserver>;

/// Render-thread playback state.
struct PlayState {
    generation: u64,
    needs_seek: bool,
    position: f64,
    bounds: Option<Bounds>,
    active: bool,
    scrubbing: bool,
    last_scrub: f64,
    filters: [OnePole; MAX_FILTERED_CHANNELS],
    seq_edges: EdgeDetector,
}

impl PlayState {
    fn new(sample_rate: f32) -> Self {
        Self {
            generation: 0,
            needs_seek: true,
            position: 0.0,
            bounds: None,
            active: false,
            scrubbing: false,
            last_scrub: 0.0,
            filters: core::array::from_fn(|_| OnePole::new(sample_rate, SMOOTHING_CUTOFF_HZ)),
            seq_edges: EdgeDetector::new(),
        }
    }

    fn reload(&mut self, generation: u64) {
        self.generation = generation;
        self.needs_seek = true;
        self.position = 0.0;
        self.bounds = None;
        self.filters.iter_mut().for_each(OnePole::reset);
        self.seq_edges.reset();
    }

    /// Smooths one frame in place.
    fn filter_frame(&mut self, frame: &mut [f32]) {
        for (c, sample) in frame.iter_mut().enumerate() {
            if let Some(filter) = self.filters.get_mut(c) {
                *sample = filter.process(*sample);
            }
        }
    }

    /// Reads one frame at the current position into `frame`.
    fn read_frame(&mut self, clip: &Clip, frame: &mut [f32], gain: f32) {
        for (c, sample) in frame.iter_mut().enumerate() {
            *sample = interpolate(clip.samples(), clip.channels(), c, self.position) * gain;
        }
        self.filter_frame(frame);
    }
}

/// Variable-speed clip player with bounds, looping, scrub and turntable modes.
pub struct ClipPlayer {
    session: Arc<SessionContext>,
    clip: ArcSwapOption<Clip>,
    generation: AtomicU64,

    speed: AtomicF32,
    amplitude: AtomicF32,
    looping: AtomicBool,
    reverse: AtomicBool,
    head: AtomicF32,
    tail: AtomicF32,
    window: AtomicUsize,
    command: AtomicU8,
    scrubbing: AtomicBool,
    scrub_target: AtomicF64,
    turntable: AtomicBool,
    nudge: AtomicF64,

    playing: AtomicBool,
    position: AtomicF64,
    bound_head: AtomicF64,
    bound_tail: AtomicF64,

    head_mod: Jack,
    tail_mod: Jack,
    exp_pitch: Jack,
    lin_pitch: Jack,
    amp_mod: Jack,
    seq: Jack,
    observer: ArcSwapOption<SharedObserver>,

    guard: CycleGuard,
    scratch: ScratchBank,
    state: Mutex<PlayState>,
}

impl ClipPlayer {
    /// Creates a stopped player with no clip, unit speed and amplitude, full
    /// bounds and looping off.
    pub fn new(session: Arc<SessionContext>) -> Self {
        let sample_rate = session.sample_rate();
        Self {
            session,
            clip: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            speed: AtomicF32::new(1.0),
            amplitude: AtomicF32::new(1.0),
            looping: AtomicBool::new(false),
            reverse: AtomicBool::new(false),
            head: AtomicF32::new(0.0),
            tail: AtomicF32::new(1.0),
            window: AtomicUsize::new(0),
            command: AtomicU8::new(CMD_NONE),
            scrubbing: AtomicBool::new(false),
            scrub_target: AtomicF64::new(0.0),
            turntable: AtomicBool::new(false),
            nudge: AtomicF64::new(0.0),
            playing: AtomicBool::new(false),
            position: AtomicF64::new(0.0),
            bound_head: AtomicF64::new(0.0),
            bound_tail: AtomicF64::new(0.0),
            head_mod: Jack::new(),
            tail_mod: Jack::new(),
            exp_pitch: Jack::new(),
            lin_pitch: Jack::new(),
            amp_mod: Jack::new(),
            seq: Jack::new(),
            observer: ArcSwapOption::empty(),
            guard: CycleGuard::new(),
            scratch: ScratchBank::new(4),
            state: Mutex::new(PlayState::new(sample_rate)),
        }
    }

    // --- sample source ---

    /// Installs a clip. Playback restarts at the head on the next callback.
    pub fn load_clip(&self, clip: Clip) {
        self.load_shared(Arc::new(clip));
    }

    /// Installs a clip shared with other players.
    pub fn load_shared(&self, clip: Arc<Clip>) {
        #[cfg(feature = "tracing")]
        {
            if clip.frames() < BOUND_PADDING {
                tracing::warn!(frames = clip.frames(), "clip_too_short");
            } else {
                tracing::debug!(
                    frames = clip.frames(),
                    channels = clip.channels(),
                    sample_rate = clip.sample_rate(),
                    "clip_loaded"
                );
            }
        }
        self.clip.store(Some(clip));
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Removes the clip; the player renders silence until another is loaded.
    pub fn unload(&self) {
        self.clip.store(None);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// True once a clip is loaded.
    pub fn is_loaded(&self) -> bool {
        self.clip.load().is_some()
    }

    /// The loaded clip.
    pub fn clip(&self) -> Option<Arc<Clip>> {
        self.clip.load_full()
    }

    // --- parameters ---

    /// Sets the speed, clamped to `±MAX_SPEED`. Non-finite values are ignored.
    pub fn set_speed(&self, speed: f32) {
        if speed.is_finite() {
            self.speed.store(speed.clamp(-MAX_SPEED, MAX_SPEED));
        }
    }

    /// Current speed.
    pub fn speed(&self) -> f32 {
        self.speed.load()
    }

    /// Sets the output amplitude (non-negative). Non-finite values are ignored.
    pub fn set_amplitude(&self, amplitude: f32) {
        if amplitude.is_finite() {
            self.amplitude.store(amplitude.max(0.0));
        }
    }

    /// Current amplitude.
    pub fn amplitude(&self) -> f32 {
        self.amplitude.load()
    }

    /// Enables looping between the bounds.
    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    /// True when looping is enabled.
    pub fn looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }

    /// Plays backwards when set.
    pub fn set_reverse(&self, reverse: bool) {
        self.reverse.store(reverse, Ordering::Relaxed);
    }

    /// True when playing backwards.
    pub fn reverse(&self) -> bool {
        self.reverse.load(Ordering::Relaxed)
    }

    /// Sets the manual bounds as fractions of the clip length. Invalid pairs
    /// are stored but ignored by the render thread, which keeps the last
    /// valid bounds.
    pub fn set_bounds(&self, head: f32, tail: f32) {
        self.head.store(head);
        self.tail.store(tail);
    }

    /// Manual bounds as set.
    pub fn manual_bounds(&self) -> (f32, f32) {
        (self.head.load(), self.tail.load())
    }

    /// Bounds in effect during the last callback, in frames.
    pub fn resolved_bounds(&self) -> Option<(f64, f64)> {
        let tail = self.bound_tail.load();
        (tail > 0.0).then(|| (self.bound_head.load(), tail))
    }

    /// Sets the fade window length in frames (0 disables it).
    pub fn set_window(&self, frames: usize) {
        self.window.store(frames, Ordering::Relaxed);
    }

    /// Fade window length in frames.
    pub fn window(&self) -> usize {
        self.window.load(Ordering::Relaxed)
    }

    // --- transport ---

    /// Starts playback from the bound matching the direction.
    pub fn play(&self) {
        self.command.store(CMD_PLAY, Ordering::Relaxed);
    }

    /// Stops playback.
    pub fn stop(&self) {
        self.command.store(CMD_STOP, Ordering::Relaxed);
    }

    /// True while the render thread is playing.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Playback position in frames after the last callback.
    pub fn position(&self) -> f64 {
        self.position.load()
    }

    /// Playback position as a fraction of the clip length.
    pub fn position_normalized(&self) -> f64 {
        let frames = self.clip.load().as_ref().map_or(0, |c| c.frames());
        if frames == 0 {
            0.0
        } else {
            self.position() / frames as f64
        }
    }

    // --- interaction modes ---

    /// Enters or leaves scrub mode.
    pub fn set_scrubbing(&self, scrubbing: bool) {
        self.scrubbing.store(scrubbing, Ordering::Relaxed);
    }

    /// Moves the scrub target, as a fraction of the clip length.
    pub fn scrub_to(&self, position: f64) {
        if position.is_finite() {
            self.scrub_target.store(position.clamp(0.0, 1.0));
        }
    }

    /// Enters or leaves turntable mode.
    pub fn set_turntable(&self, enabled: bool) {
        self.turntable.store(enabled, Ordering::Relaxed);
    }

    /// Accumulates a turntable nudge of `frames`, consumed by the next callback.
    pub fn nudge(&self, frames: f64) {
        if frames.is_finite() {
            self.nudge.fetch_add(frames);
        }
    }

    // --- modulation inputs ---

    /// Head bound modulation. The first sample of each callback, mapped from
    /// `[-1, 1]` to `[0, 1]`, replaces the manual head.
    pub fn head_mod(&self) -> &Jack {
        &self.head_mod
    }

    /// Tail bound modulation, mapped like [`head_mod`](Self::head_mod).
    pub fn tail_mod(&self) -> &Jack {
        &self.tail_mod
    }

    /// Exponential pitch: speed scales by `2^(cv * EXP_PITCH_OCTAVES)`.
    pub fn exp_pitch(&self) -> &Jack {
        &self.exp_pitch
    }

    /// Linear pitch: `cv * LIN_PITCH_RANGE` is added to the speed.
    pub fn lin_pitch(&self) -> &Jack {
        &self.lin_pitch
    }

    /// Amplitude modulation: amplitude scales by the cv mapped to `[0, 1]`.
    pub fn amp_mod(&self) -> &Jack {
        &self.amp_mod
    }

    /// Sequence input: each rising edge restarts playback.
    pub fn seq_input(&self) -> &Jack {
        &self.seq
    }

    /// Installs the play-state observer.
    pub fn set_observer(&self, observer: SharedObserver) {
        self.observer.store(Some(Arc::new(observer)));
    }

    /// Removes the play-state observer.
    pub fn clear_observer(&self) {
        self.observer.store(None);
    }

    /// Session the player was built for.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    // --- render helpers ---

    fn bound_value(
        &self,
        jack: &Jack,
        manual: f32,
        token: &GuardToken<'_>,
        len: usize,
        ctx: &RenderContext,
    ) -> f32 {
        if !jack.is_connected() {
            return manual;
        }
        match self.scratch.lease(token, LANE_BOUND, len) {
            Some(mut lane) => {
                jack.pull(&mut lane, ctx);
                lane.first().map_or(manual, |&s| bipolar_to_unipolar(s))
            }
            None => manual,
        }
    }

    fn pull_mod<'a>(
        &'a self,
        jack: &Jack,
        lane: usize,
        token: &GuardToken<'_>,
        len: usize,
        ctx: &RenderContext,
    ) -> Option<ScratchLease<'a>> {
        if !jack.is_connected() {
            return None;
        }
        let mut lease = self.scratch.lease(token, lane, len)?;
        jack.pull(&mut lease, ctx);
        Some(lease)
    }

    fn render_normal(
        &self,
        state: &mut PlayState,
        clip: &Clip,
        bounds: Bounds,
        out: &mut [f32],
        ctx: &RenderContext,
        token: &GuardToken<'_>,
    ) {
        let channels = ctx.channels;
        let len = out.len();
        let exp = self.pull_mod(&self.exp_pitch, LANE_EXP, token, len, ctx);
        let lin = self.pull_mod(&self.lin_pitch, LANE_LIN, token, len, ctx);
        let amp = self.pull_mod(&self.amp_mod, LANE_AMP, token, len, ctx);
        let seq = self.pull_mod(&self.seq, LANE_SEQ, token, len, ctx);

        let reverse = self.reverse();
        let looping = self.looping();
        let direction = if reverse { -1.0 } else { 1.0 };
        let ratio = clip.sample_rate() / ctx.sample_rate;
        let speed = self.speed();
        let amplitude = self.amplitude();
        let window = self.window();

        if state.active && !bounds.contains(state.position) {
            state.position = if looping {
                bounds.wrap(state.position)
            } else {
                state.position.clamp(bounds.head(), bounds.tail() - 1.0)
            };
        }

        for (f, frame) in out.chunks_exact_mut(channels).enumerate() {
            let at = f * channels;
            if let Some(seq) = seq.as_deref() {
                if state.seq_edges.process(seq[at]) {
                    state.position = bounds.start(reverse);
                    state.active = true;
                }
            }
            if !state.active {
                frame.fill(0.0);
                state.filter_frame(frame);
                continue;
            }

            let cv = |lane: &Option<ScratchLease<'_>>| lane.as_deref().map(|l| finite_or_zero(l[at]));
            let octaves = cv(&exp).map_or(1.0, |v| exp2f(v * EXP_PITCH_OCTAVES));
            let offset = cv(&lin).map_or(0.0, |v| v * LIN_PITCH_RANGE);
            let gain = amplitude
                * cv(&amp).map_or(1.0, |v| bipolar_to_unipolar(v).clamp(0.0, 1.0))
                * bounds.window_gain(state.position, window);

            state.read_frame(clip, frame, gain);

            let increment = f64::from(direction * (speed * octaves + offset) * ratio);
            let next = state.position + if increment.is_finite() { increment } else { 0.0 };
            state.position = if bounds.contains(next) {
                next
            } else if looping {
                bounds.wrap(next)
            } else {
                state.active = false;
                next.clamp(bounds.head(), bounds.tail())
            };
        }
    }

    fn render_scrub(&self, state: &mut PlayState, clip: &Clip, out: &mut [f32], channels: usize) {
        let last_frame = clip.frames().saturating_sub(1) as f64;
        let target = self.scrub_target.load() * last_frame;
        if !state.scrubbing {
            state.scrubbing = true;
            state.last_scrub = state.position;
        }
        let frames = (out.len() / channels).max(1);
        let increment = (target - state.last_scrub) / frames as f64;
        let amplitude = self.amplitude();
        resample_block(clip.samples(), clip.channels(), out, channels, state.last_scrub, increment);
        for frame in out.chunks_exact_mut(channels) {
            frame.iter_mut().for_each(|s| *s *= amplitude);
            state.filter_frame(frame);
        }
        state.position = target;
        state.last_scrub = target;
    }

    fn render_turntable(
        &self,
        state: &mut PlayState,
        clip: &Clip,
        bounds: Bounds,
        out: &mut [f32],
        channels: usize,
    ) {
        let delta = self.nudge.swap(0.0);
        if delta == 0.0 || !delta.is_finite() {
            for frame in out.chunks_exact_mut(channels) {
                frame.fill(0.0);
                state.filter_frame(frame);
            }
            return;
        }
        let frames = (out.len() / channels).max(1);
        let increment = delta / frames as f64;
        let amplitude = self.amplitude();
        state.position = bounds.wrap(state.position);
        for frame in out.chunks_exact_mut(channels) {
            state.read_frame(clip, frame, amplitude);
            state.position = bounds.wrap(state.position + increment);
        }
    }
}

#[inline]
fn finite_or_zero(x: f32) -> f32 {
    if x.is_finite() { x } else { 0.0 }
}

impl AudioNode for ClipPlayer {
    fn render(&self, out: &mut [f32], ctx: &RenderContext) -> RenderStatus {
        self.guard.render(out, |token, out| {
            out.fill(0.0);
            let clip = self.clip.load_full();
            let Some(clip) = clip.as_deref() else {
                return RenderStatus::Silent;
            };
            let Some(mut state) = self.state.try_lock() else {
                return RenderStatus::Silent;
            };

            let generation = self.generation.load(Ordering::Acquire);
            if state.generation != generation {
                state.reload(generation);
            }

            let (manual_head, manual_tail) = self.manual_bounds();
            let head = self.bound_value(&self.head_mod, manual_head, token, out.len(), ctx);
            let tail = self.bound_value(&self.tail_mod, manual_tail, token, out.len(), ctx);
            if let Some(bounds) = Bounds::resolve(head, tail, clip.frames()) {
                state.bounds = Some(bounds);
            } else if state.bounds.is_none() {
                state.bounds = Bounds::full(clip.frames());
            }
            let Some(bounds) = state.bounds else {
                return RenderStatus::Silent;
            };
            self.bound_head.store(bounds.head());
            self.bound_tail.store(bounds.tail());

            let reverse = self.reverse();
            if state.needs_seek {
                state.needs_seek = false;
                state.position = bounds.start(reverse);
            }

            let was_active = state.active;
            match self.command.swap(CMD_NONE, Ordering::Relaxed) {
                CMD_PLAY => {
                    state.position = bounds.start(reverse);
                    state.active = true;
                }
                CMD_STOP => state.active = false,
                _ => {}
            }

            let channels = ctx.channels;
            if self.scrubbing.load(Ordering::Relaxed) {
                self.render_scrub(&mut state, clip, out, channels);
            } else {
                state.scrubbing = false;
                if self.turntable.load(Ordering::Relaxed) {
                    self.render_turntable(&mut state, clip, bounds, out, channels);
                } else {
                    self.render_normal(&mut state, clip, bounds, out, ctx, token);
                }
            }

            if !state.position.is_finite() {
                state.position = bounds.start(reverse);
            }
            self.position.store(state.position);
            self.playing.store(state.active, Ordering::Relaxed);
            if state.active != was_active {
                if let Some(observer) = self.observer.load().as_deref() {
                    observer.on_play_state(state.active);
                }
            }

            if out.iter().any(|&s| s != 0.0) {
                RenderStatus::Rendered
            } else {
                RenderStatus::Silent
            }
        })
    }

    fn label(&self) -> &'static str {
        "clip_player"
    }
}

impl core::fmt::Debug for ClipPlayer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClipPlayer")
            .field("loaded", &self.is_loaded())
            .field("playing", &self.is_playing())
            .field("speed", &self.speed())
            .field("amplitude", &self.amplitude())
            .field("looping", &self.looping())
            .field("reverse", &self.reverse())
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}
