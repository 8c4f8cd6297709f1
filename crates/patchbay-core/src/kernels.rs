//! Numeric kernels used on the render path.
//!
//! Small, allocation-free building blocks: constant fills, fractional-index
//! interpolation into interleaved sample arrays, variable-rate block reads,
//! and edge/level detection on control signals.
//!
//! # Conventions
//!
//! Buffers are interleaved: frame `f`, channel `c` lives at `f * channels + c`.
//! Positions are fractional frame indices (`f64`, so long clips keep sub-sample
//! precision). Out-of-range and non-finite inputs never panic; they clamp or
//! produce silence.

use core::ops::Range;

/// Fills every sample of `buf` with `value`.
#[inline]
pub fn fill(buf: &mut [f32], value: f32) {
    buf.fill(value);
}

/// Writes `value` into every channel of the frames in `frames`.
///
/// The range is clipped to the buffer, so a pulse that would run past the end
/// of a block is truncated rather than wrapped.
pub fn fill_frames(buf: &mut [f32], channels: usize, frames: Range<usize>, value: f32) {
    let channels = channels.max(1);
    let total = buf.len() / channels;
    let start = frames.start.min(total);
    let end = frames.end.min(total);
    if start >= end {
        return;
    }
    buf[start * channels..end * channels].fill(value);
}

/// Reads channel `channel` of an interleaved array at a fractional frame
/// position using linear interpolation.
///
/// The position is clamped to `[0, frames - 1]`; the read at the last frame
/// holds that frame's value. `channel` wraps modulo `channels`, so a mono clip
/// feeds every output channel. Empty arrays and non-finite positions read 0.
#[inline]
pub fn interpolate(samples: &[f32], channels: usize, channel: usize, position: f64) -> f32 {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    if frames == 0 || !position.is_finite() {
        return 0.0;
    }
    let channel = channel % channels;
    let last = frames - 1;
    let pos = position.clamp(0.0, last as f64);
    let index = pos as usize;
    let frac = (pos - index as f64) as f32;
    let a = samples[index * channels + channel];
    let b = samples[(index + 1).min(last) * channels + channel];
    a + (b - a) * frac
}

/// Reads `out.len() / out_channels` frames from `samples` starting at `start`
/// and stepping `increment` frames per output frame.
///
/// No wrapping is applied; reads past either end hold the edge frame. Returns
/// the position after the last frame read.
pub fn resample_block(
    samples: &[f32],
    src_channels: usize,
    out: &mut [f32],
    out_channels: usize,
    start: f64,
    increment: f64,
) -> f64 {
    let out_channels = out_channels.max(1);
    let mut position = start;
    for frame in out.chunks_exact_mut(out_channels) {
        for (c, sample) in frame.iter_mut().enumerate() {
            *sample = interpolate(samples, src_channels, c, position);
        }
        position += increment;
    }
    position
}

/// Rising-edge rule shared by clock and trigger inputs.
///
/// An edge is reported when the signal rises (`current > prev`) out of a flat
/// or falling stretch (`prev <= prev_prev`). A held high level therefore fires
/// once, and a slow ramp fires only at its start.
#[inline]
pub fn detect_rising_edge(prev_prev: f32, prev: f32, current: f32) -> bool {
    current > prev && prev <= prev_prev
}

/// Stateful [`detect_rising_edge`] that carries history across buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeDetector {
    prev: f32,
    prev_prev: f32,
}

impl EdgeDetector {
    /// Creates a detector with a silent history.
    pub const fn new() -> Self {
        Self {
            prev: 0.0,
            prev_prev: 0.0,
        }
    }

    /// Feeds one sample; returns true on a rising edge.
    #[inline]
    pub fn process(&mut self, sample: f32) -> bool {
        let sample = if sample.is_finite() { sample } else { 0.0 };
        let rising = detect_rising_edge(self.prev_prev, self.prev, sample);
        self.prev_prev = self.prev;
        self.prev = sample;
        rising
    }

    /// Forgets the history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Classification of a control buffer against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryState {
    /// Every sample is at or below the threshold (or the buffer is empty).
    Low,
    /// Every sample is above the threshold.
    High,
    /// The buffer crosses the threshold.
    Mixed,
}

/// Classifies `buf` as wholly low, wholly high, or mixed.
pub fn binary_state(buf: &[f32], threshold: f32) -> BinaryState {
    let mut high = false;
    let mut low = false;
    for &s in buf {
        if s > threshold {
            high = true;
        } else {
            low = true;
        }
        if high && low {
            return BinaryState::Mixed;
        }
    }
    if high {
        BinaryState::High
    } else {
        BinaryState::Low
    }
}

/// Maps a bipolar control value (`-1..=1`) onto `0..=1`.
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Maps a unipolar control value (`0..=1`) onto `-1..=1`.
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    unipolar * 2.0 - 1.0
}
