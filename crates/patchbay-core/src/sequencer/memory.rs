//! Fixed-capacity pattern grid.
//!
//! Cells are allocated once for the full `MAX_PATTERNS × MAX_ROWS × MAX_STEPS`
//! grid in one row-major arena. Resizing the sequencer only changes which
//! sub-rectangle is active; nothing here reallocates.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::ControlError;
use crate::shared::AtomicF32;

/// Number of patterns held in memory.
pub const MAX_PATTERNS: usize = 16;

/// Largest number of rows a sequencer can activate.
pub const MAX_ROWS: usize = 8;

/// Largest number of steps a sequencer can activate.
pub const MAX_STEPS: usize = 16;

/// One grid cell: a gate flag for trigger rows and a level for continuous rows.
#[derive(Debug, Default)]
pub struct StepCell {
    on: AtomicBool,
    value: AtomicF32,
}

impl StepCell {
    /// Gate flag.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }

    /// Level in `[0, 1]`.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value.load()
    }

    fn clear(&self) {
        self.on.store(false, Ordering::Relaxed);
        self.value.store(0.0);
    }

    fn copy_from(&self, other: &StepCell) {
        self.on.store(other.is_on(), Ordering::Relaxed);
        self.value.store(other.value());
    }
}

/// Snapshot of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepState {
    /// Gate flag.
    pub on: bool,
    /// Level in `[0, 1]`.
    pub value: f32,
}

/// A value written into a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepValue {
    /// Sets the gate flag.
    Gate(bool),
    /// Sets the level; clamped to `[0, 1]`, non-finite values are ignored.
    Level(f32),
}

impl From<bool> for StepValue {
    fn from(on: bool) -> Self {
        StepValue::Gate(on)
    }
}

impl From<f32> for StepValue {
    fn from(value: f32) -> Self {
        StepValue::Level(value)
    }
}

/// The `[pattern][row][step]` grid.
pub struct PatternMemory {
    cells: Box<[StepCell]>,
}

impl PatternMemory {
    /// Allocates the full grid with every cell off and at 0.
    pub fn new() -> Self {
        Self {
            cells: (0..MAX_PATTERNS * MAX_ROWS * MAX_STEPS)
                .map(|_| StepCell::default())
                .collect(),
        }
    }

    /// Validates an address and returns its arena index.
    pub fn index(pattern: usize, row: usize, step: usize) -> Result<usize, ControlError> {
        if pattern >= MAX_PATTERNS {
            return Err(ControlError::PatternOutOfRange {
                index: pattern,
                capacity: MAX_PATTERNS,
            });
        }
        if row >= MAX_ROWS {
            return Err(ControlError::RowOutOfRange {
                index: row,
                capacity: MAX_ROWS,
            });
        }
        if step >= MAX_STEPS {
            return Err(ControlError::StepOutOfRange {
                index: step,
                capacity: MAX_STEPS,
            });
        }
        Ok((pattern * MAX_ROWS + row) * MAX_STEPS + step)
    }

    /// Cell at an address, or `None` when out of range.
    #[inline]
    pub fn cell(&self, pattern: usize, row: usize, step: usize) -> Option<&StepCell> {
        Self::index(pattern, row, step)
            .ok()
            .and_then(|i| self.cells.get(i))
    }

    /// Reads a cell.
    pub fn get(&self, pattern: usize, row: usize, step: usize) -> Result<StepState, ControlError> {
        let cell = &self.cells[Self::index(pattern, row, step)?];
        Ok(StepState {
            on: cell.is_on(),
            value: cell.value(),
        })
    }

    /// Writes a cell.
    pub fn set(
        &self,
        pattern: usize,
        row: usize,
        step: usize,
        value: StepValue,
    ) -> Result<(), ControlError> {
        let cell = &self.cells[Self::index(pattern, row, step)?];
        match value {
            StepValue::Gate(on) => cell.on.store(on, Ordering::Relaxed),
            StepValue::Level(v) if v.is_finite() => cell.value.store(v.clamp(0.0, 1.0)),
            StepValue::Level(_) => {}
        }
        Ok(())
    }

    /// Clears rows `rows` in every pattern.
    pub fn clear_rows(&self, rows: core::ops::Range<usize>) {
        for pattern in 0..MAX_PATTERNS {
            for row in rows.start..rows.end.min(MAX_ROWS) {
                for step in 0..MAX_STEPS {
                    self.clear_cell(pattern, row, step);
                }
            }
        }
    }

    /// Clears steps `steps` of every row in every pattern.
    pub fn clear_steps(&self, steps: core::ops::Range<usize>) {
        for pattern in 0..MAX_PATTERNS {
            for row in 0..MAX_ROWS {
                for step in steps.start..steps.end.min(MAX_STEPS) {
                    self.clear_cell(pattern, row, step);
                }
            }
        }
    }

    /// Clears every cell of one pattern.
    pub fn clear_pattern(&self, pattern: usize) -> Result<(), ControlError> {
        Self::index(pattern, 0, 0)?;
        for row in 0..MAX_ROWS {
            for step in 0..MAX_STEPS {
                self.clear_cell(pattern, row, step);
            }
        }
        Ok(())
    }

    /// Copies every cell of `src` over `dst`.
    pub fn copy_pattern(&self, src: usize, dst: usize) -> Result<(), ControlError> {
        let from = Self::index(src, 0, 0)?;
        let to = Self::index(dst, 0, 0)?;
        let len = MAX_ROWS * MAX_STEPS;
        if from != to {
            for i in 0..len {
                self.cells[to + i].copy_from(&self.cells[from + i]);
            }
        }
        Ok(())
    }

    fn clear_cell(&self, pattern: usize, row: usize, step: usize) {
        if let Some(cell) = self.cell(pattern, row, step) {
            cell.clear();
        }
    }
}

impl Default for PatternMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PatternMemory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PatternMemory")
            .field("patterns", &MAX_PATTERNS)
            .field("rows", &MAX_ROWS)
            .field("steps", &MAX_STEPS)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_is_row_major() {
        assert_eq!(PatternMemory::index(0, 0, 1).unwrap(), 1);
        assert_eq!(PatternMemory::index(0, 1, 0).unwrap(), MAX_STEPS);
        assert_eq!(PatternMemory::index(1, 0, 0).unwrap(), MAX_ROWS * MAX_STEPS);
    }

    #[test]
    fn out_of_range_addresses_are_errors() {
        assert!(matches!(
            PatternMemory::index(MAX_PATTERNS, 0, 0),
            Err(ControlError::PatternOutOfRange { .. })
        ));
        assert!(matches!(
            PatternMemory::index(0, MAX_ROWS, 0),
            Err(ControlError::RowOutOfRange { .. })
        ));
        assert!(matches!(
            PatternMemory::index(0, 0, MAX_STEPS),
            Err(ControlError::StepOutOfRange { .. })
        ));
    }

    #[test]
    fn levels_are_clamped_and_nan_ignored() {
        let memory = PatternMemory::new();
        memory.set(0, 0, 0, StepValue::Level(0.4)).unwrap();
        memory.set(0, 0, 0, f32::NAN.into()).unwrap();
        assert_eq!(memory.get(0, 0, 0).unwrap().value, 0.4);
        memory.set(0, 0, 0, StepValue::Level(3.0)).unwrap();
        assert_eq!(memory.get(0, 0, 0).unwrap().value, 1.0);
    }

    #[test]
    fn copy_and_clear_pattern() {
        let memory = PatternMemory::new();
        memory.set(2, 3, 4, true.into()).unwrap();
        memory.set(2, 3, 4, StepValue::Level(0.75)).unwrap();
        memory.copy_pattern(2, 5).unwrap();
        assert_eq!(
            memory.get(5, 3, 4).unwrap(),
            StepState {
                on: true,
                value: 0.75
            }
        );
        memory.clear_pattern(2).unwrap();
        assert_eq!(memory.get(2, 3, 4).unwrap(), StepState::default());
        assert!(memory.get(5, 3, 4).unwrap().on);
    }

    #[test]
    fn clear_steps_spans_all_patterns() {
        let memory = PatternMemory::new();
        memory.set(0, 0, 10, true.into()).unwrap();
        memory.set(7, 6, 12, true.into()).unwrap();
        memory.set(7, 6, 3, true.into()).unwrap();
        memory.clear_steps(8..MAX_STEPS);
        assert!(!memory.get(0, 0, 10).unwrap().on);
        assert!(!memory.get(7, 6, 12).unwrap().on);
        assert!(memory.get(7, 6, 3).unwrap().on);
    }
}
