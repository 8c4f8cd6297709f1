//! Errors for fallible control-thread operations.
//!
//! The render path never returns these; it degrades to silence and reports a
//! [`RenderStatus`](crate::RenderStatus) instead.

use thiserror::Error;

/// Errors raised by setters and editing operations on devices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Pattern index outside the pattern memory.
    #[error("pattern {index} out of range (capacity {capacity})")]
    PatternOutOfRange {
        /// Requested pattern.
        index: usize,
        /// Number of patterns available.
        capacity: usize,
    },

    /// Row index outside the pattern memory.
    #[error("row {index} out of range (capacity {capacity})")]
    RowOutOfRange {
        /// Requested row.
        index: usize,
        /// Number of rows available.
        capacity: usize,
    },

    /// Step index outside the pattern memory.
    #[error("step {index} out of range (capacity {capacity})")]
    StepOutOfRange {
        /// Requested step.
        index: usize,
        /// Number of steps available.
        capacity: usize,
    },

    /// A resize request outside `min..=max`.
    #[error("{what} count {requested} outside {min}..={max}")]
    Dimension {
        /// Which dimension was resized.
        what: &'static str,
        /// Requested count.
        requested: usize,
        /// Smallest allowed count.
        min: usize,
        /// Largest allowed count.
        max: usize,
    },

    /// Tempo selector that names no step division.
    #[error("unsupported tempo selector {0} (expected 1, 2, 4, 8, 16 or 32)")]
    TempoSelector(u32),

    /// Sample data rejected by the clip player.
    #[error("invalid clip: {0}")]
    InvalidClip(String),
}

impl ControlError {
    /// Create an invalid clip error.
    pub fn invalid_clip(reason: impl Into<String>) -> Self {
        ControlError::InvalidClip(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_index() {
        let err = ControlError::StepOutOfRange {
            index: 20,
            capacity: 16,
        };
        assert_eq!(err.to_string(), "step 20 out of range (capacity 16)");

        let err = ControlError::Dimension {
            what: "row",
            requested: 0,
            min: 1,
            max: 8,
        };
        assert!(err.to_string().contains("row count 0"));
    }
}
