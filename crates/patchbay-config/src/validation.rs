//! Preset validation.
//!
//! Presets are checked in full before anything is applied to a live device, so
//! a bad file never leaves a clock or sequencer half-configured. Every check in
//! a preset runs; all failures are reported together.
//!
//! # Example
//!
//! ```rust
//! use patchbay_config::{ClockPreset, validate_clock};
//!
//! let mut clock = ClockPreset::default();
//! assert!(validate_clock(&clock).is_ok());
//!
//! clock.tempo_selector = 3;
//! assert!(validate_clock(&clock).is_err());
//! ```

use patchbay_core::clip::MAX_SPEED;
use patchbay_core::context::{MAX_BPM, MIN_BPM};
use patchbay_core::{MAX_PATTERNS, MAX_ROWS, MAX_STEPS, MAX_SWING, StepDivision};
use thiserror::Error;

use crate::clip::ClipPreset;
use crate::clock::ClockPreset;
use crate::sequencer::SequencerPreset;
use crate::session::SessionPreset;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric field outside its accepted range, or not finite.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the field.
        field: String,
        /// The offending value.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Count or index outside its accepted range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    Count {
        /// Name of the field.
        field: String,
        /// The offending value.
        value: usize,
        /// Minimum allowed value.
        min: usize,
        /// Maximum allowed value.
        max: usize,
    },

    /// Tempo selector that names no step division.
    #[error("unknown tempo selector {0}")]
    UnknownTempoSelector(u32),

    /// Head and tail that do not form a playable range.
    #[error("clip bounds head {head} and tail {tail} must satisfy 0 <= head < tail <= 1")]
    InvalidBounds {
        /// Normalized head.
        head: f32,
        /// Normalized tail.
        tail: f32,
    },

    /// A pattern grid larger than the active dimensions.
    #[error("pattern {pattern}: {reason}")]
    GridShape {
        /// Pattern index.
        pattern: usize,
        /// What is wrong with the grid.
        reason: String,
    },

    /// The same pattern index stored twice.
    #[error("pattern {0} appears more than once")]
    DuplicatePattern(usize),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Folds collected errors into a result.
fn finish(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: &str, value: f32, min: f32, max: f32) {
    if !(value.is_finite() && (min..=max).contains(&value)) {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

fn check_count(errors: &mut Vec<ValidationError>, field: &str, value: usize, min: usize, max: usize) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::Count {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

/// Validates a clock snapshot: known tempo selector, swing within range.
pub fn validate_clock(clock: &ClockPreset) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if StepDivision::from_selector(clock.tempo_selector).is_none() {
        errors.push(ValidationError::UnknownTempoSelector(clock.tempo_selector));
    }
    check_range(&mut errors, "swing", clock.swing, 0.0, MAX_SWING);
    check_range(&mut errors, "swing_depth", clock.swing_depth, 0.0, 0.99);
    finish(errors)
}

/// Validates a sequencer snapshot against the pattern memory capacity and
/// its own active dimensions.
pub fn validate_sequencer(seq: &SequencerPreset) -> ValidationResult<()> {
    let mut errors = Vec::new();
    check_count(&mut errors, "active_rows", seq.active_rows, 1, MAX_ROWS);
    check_count(&mut errors, "active_steps", seq.active_steps, 1, MAX_STEPS);
    check_count(&mut errors, "pattern", seq.pattern, 0, MAX_PATTERNS - 1);
    check_count(&mut errors, "rows", seq.rows.len(), 0, seq.active_rows);

    let mut seen = [false; MAX_PATTERNS];
    for pattern in &seq.patterns {
        let index = pattern.index;
        match seen.get_mut(index) {
            None => {
                check_count(&mut errors, "patterns.index", index, 0, MAX_PATTERNS - 1);
                continue;
            }
            Some(slot) if *slot => errors.push(ValidationError::DuplicatePattern(index)),
            Some(slot) => *slot = true,
        }

        for (name, rows) in [("gates", pattern.gates.len()), ("levels", pattern.levels.len())] {
            if rows > seq.active_rows {
                errors.push(ValidationError::GridShape {
                    pattern: index,
                    reason: format!("{name} has {rows} rows, {} active", seq.active_rows),
                });
            }
        }
        let widest = pattern
            .gates
            .iter()
            .map(Vec::len)
            .chain(pattern.levels.iter().map(Vec::len))
            .max()
            .unwrap_or(0);
        if widest > seq.active_steps {
            errors.push(ValidationError::GridShape {
                pattern: index,
                reason: format!("row has {widest} steps, {} active", seq.active_steps),
            });
        }
        for level in pattern.levels.iter().flatten() {
            check_range(&mut errors, "levels", *level, 0.0, 1.0);
        }
    }
    finish(errors)
}

/// Validates a clip player snapshot: finite speed and amplitude, ordered bounds.
pub fn validate_clip(clip: &ClipPreset) -> ValidationResult<()> {
    let mut errors = Vec::new();
    check_range(&mut errors, "speed", clip.speed, -MAX_SPEED, MAX_SPEED);
    check_range(&mut errors, "amplitude", clip.amplitude, 0.0, 4.0);
    let ordered = clip.head.is_finite()
        && clip.tail.is_finite()
        && clip.head >= 0.0
        && clip.tail <= 1.0
        && clip.head < clip.tail;
    if !ordered {
        errors.push(ValidationError::InvalidBounds {
            head: clip.head,
            tail: clip.tail,
        });
    }
    finish(errors)
}

/// Validates a whole session preset.
pub fn validate_session(preset: &SessionPreset) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if preset.sample_rate == 0 {
        errors.push(ValidationError::Count {
            field: "sample_rate".to_string(),
            value: 0,
            min: 1,
            max: u32::MAX as usize,
        });
    }
    check_range(&mut errors, "bpm", preset.bpm, MIN_BPM, MAX_BPM);

    let parts = [
        validate_clock(&preset.clock),
        validate_sequencer(&preset.sequencer),
        preset.clip.as_ref().map_or(Ok(()), validate_clip),
    ];
    for part in parts {
        match part {
            Ok(()) => {}
            Err(ValidationError::Multiple(inner)) => errors.extend(inner),
            Err(e) => errors.push(e),
        }
    }
    finish(errors)
}
