//! Step sequencer engine.
//!
//! A [`StepSequencer`] owns a fixed-capacity [`PatternMemory`], a set of rows,
//! and a cursor. It listens to a [`ClockNode`](crate::ClockNode): every step
//! event calls [`StepSequencer::advance`], which selects the next target step
//! and pushes that step's cells into each row's trigger and value primitives.
//! Those primitives are ordinary nodes, so the pulses and levels reach the rest
//! of the patch through the row outputs.
//!
//! # Cursor
//!
//! - `selected` is the manual scrub position set from the UI.
//! - `target` is the step whose values were last emitted. It moves on the
//!   render thread at clock time.
//! - `current` is the step the UI shows as lit. It catches up with `target`
//!   when the control thread calls [`StepSequencer::update_cursor`].
//!
//! # Resizing
//!
//! Active rows and steps are a sub-rectangle of the full grid. Growing
//! re-activates cells in place; shrinking clears the cells that fall outside
//! in every pattern.

mod memory;
mod row;

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

pub use memory::{
    MAX_PATTERNS, MAX_ROWS, MAX_STEPS, PatternMemory, StepCell, StepState, StepValue,
};
pub use row::{Row, RowMode, RowOutput, StepWidget};

use crate::clock::{ClockListener, ClockTick};
use crate::error::ControlError;
use crate::node::SharedNode;
use crate::shared::AtomicF32;

/// Rows active on a new sequencer.
pub const DEFAULT_ROWS: usize = 4;

/// Steps active on a new sequencer.
pub const DEFAULT_STEPS: usize = 16;

/// Multi-pattern step sequencer.
#[derive(Debug)]
pub struct StepSequencer {
    memory: PatternMemory,
    rows: Box<[Row]>,
    active_rows: AtomicUsize,
    active_steps: AtomicUsize,
    pattern: AtomicUsize,
    selected: AtomicUsize,
    target: AtomicUsize,
    current: AtomicUsize,
    just_reset: AtomicBool,
    forced_reset: AtomicBool,
    step_pulses: AtomicU64,
    restarts: AtomicU64,
    measure_phase: AtomicF32,
}

impl StepSequencer {
    /// Creates a sequencer with [`DEFAULT_ROWS`] × [`DEFAULT_STEPS`] active.
    pub fn new() -> Self {
        Self {
            memory: PatternMemory::new(),
            rows: (0..MAX_ROWS).map(|_| Row::new()).collect(),
            active_rows: AtomicUsize::new(DEFAULT_ROWS),
            active_steps: AtomicUsize::new(DEFAULT_STEPS),
            pattern: AtomicUsize::new(0),
            selected: AtomicUsize::new(0),
            target: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
            // The first step after creation is step 0 and is never a restart.
            just_reset: AtomicBool::new(true),
            forced_reset: AtomicBool::new(true),
            step_pulses: AtomicU64::new(0),
            restarts: AtomicU64::new(0),
            measure_phase: AtomicF32::new(0.0),
        }
    }

    /// Creates a sequencer with the given active dimensions.
    pub fn with_size(rows: usize, steps: usize) -> Result<Self, ControlError> {
        let seq = Self::new();
        seq.set_active_rows(rows)?;
        seq.set_active_steps(steps)?;
        Ok(seq)
    }

    // --- step advance (render thread) ---

    /// Advances to the next step and emits it. Returns the emitted step.
    ///
    /// `external` is true when the step event came from an external clock.
    /// Wrapping to step 0 under an external clock performs a forced restart
    /// instead, keeping playback aligned to the pattern length.
    pub fn advance(&self, external: bool) -> usize {
        let stride = usize::from(!self.just_reset.swap(false, Ordering::Relaxed));
        let forced = self.forced_reset.swap(false, Ordering::Relaxed);
        let steps = self.active_steps();
        let target = self.target.load(Ordering::Relaxed).min(steps - 1);
        let next = (target + stride) % steps;

        if next == 0 && external && !forced {
            self.force_restart();
            return self.advance(external);
        }

        self.emit(next);
        next
    }

    /// Rewinds to step 0; the next advance emits step 0 without wrapping.
    pub fn force_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
        self.rewind();
    }

    fn rewind(&self) {
        self.target.store(0, Ordering::Relaxed);
        self.just_reset.store(true, Ordering::Relaxed);
        self.forced_reset.store(true, Ordering::Relaxed);
    }

    fn emit(&self, step: usize) {
        self.target.store(step, Ordering::Relaxed);
        let pattern = self.pattern();
        for (index, row) in self.rows.iter().enumerate().take(self.active_rows()) {
            if row.is_muted() {
                continue;
            }
            if let Some(cell) = self.memory.cell(pattern, index, step) {
                row.emit(cell.is_on(), cell.value());
            }
        }
    }

    // --- cursor (control thread) ---

    /// Moves the visual cursor to the target step. Returns the new step when
    /// it moved; each move counts one step pulse.
    pub fn update_cursor(&self) -> Option<usize> {
        let target = self.target.load(Ordering::Relaxed);
        if self.current.swap(target, Ordering::Relaxed) == target {
            return None;
        }
        self.step_pulses.fetch_add(1, Ordering::Relaxed);
        Some(target)
    }

    /// Scrubs to `step`: it becomes the selected and target step and its
    /// cells are emitted immediately.
    pub fn select_step(&self, step: usize) -> Result<(), ControlError> {
        let steps = self.active_steps();
        if step >= steps {
            return Err(ControlError::StepOutOfRange {
                index: step,
                capacity: steps,
            });
        }
        self.selected.store(step, Ordering::Relaxed);
        self.just_reset.store(false, Ordering::Relaxed);
        self.emit(step);
        Ok(())
    }

    /// Manually selected step.
    pub fn selected_step(&self) -> usize {
        self.selected.load(Ordering::Relaxed)
    }

    /// Step whose values were last emitted.
    pub fn target_step(&self) -> usize {
        self.target.load(Ordering::Relaxed)
    }

    /// Step shown as lit.
    pub fn current_step(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    /// Cursor moves counted by [`update_cursor`](Self::update_cursor).
    pub fn step_pulses(&self) -> u64 {
        self.step_pulses.load(Ordering::Relaxed)
    }

    /// Forced restarts performed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Last measure phase reported by the clock, in `[0, 1)`.
    pub fn measure_phase(&self) -> f32 {
        self.measure_phase.load()
    }

    // --- pattern memory ---

    /// Writes one cell.
    pub fn set_step(
        &self,
        pattern: usize,
        row: usize,
        step: usize,
        value: impl Into<StepValue>,
    ) -> Result<(), ControlError> {
        self.memory.set(pattern, row, step, value.into())
    }

    /// Reads one cell.
    pub fn step(&self, pattern: usize, row: usize, step: usize) -> Result<StepState, ControlError> {
        self.memory.get(pattern, row, step)
    }

    /// The underlying grid.
    pub fn memory(&self) -> &PatternMemory {
        &self.memory
    }

    /// Plays pattern `pattern` from the next step on.
    pub fn select_pattern(&self, pattern: usize) -> Result<(), ControlError> {
        PatternMemory::index(pattern, 0, 0)?;
        self.pattern.store(pattern, Ordering::Relaxed);
        Ok(())
    }

    /// Currently playing pattern.
    pub fn pattern(&self) -> usize {
        self.pattern.load(Ordering::Relaxed)
    }

    /// Copies pattern `src` over `dst`.
    pub fn copy_pattern(&self, src: usize, dst: usize) -> Result<(), ControlError> {
        self.memory.copy_pattern(src, dst)
    }

    /// Clears every cell of `pattern`.
    pub fn clear_pattern(&self, pattern: usize) -> Result<(), ControlError> {
        self.memory.clear_pattern(pattern)
    }

    // --- dimensions ---

    /// Active row count.
    pub fn active_rows(&self) -> usize {
        self.active_rows.load(Ordering::Relaxed)
    }

    /// Active step count.
    pub fn active_steps(&self) -> usize {
        self.active_steps.load(Ordering::Relaxed).max(1)
    }

    /// Sets the active row count. Rows that become inactive are cleared in
    /// every pattern and their outputs silenced.
    pub fn set_active_rows(&self, rows: usize) -> Result<(), ControlError> {
        check_dimension("row", rows, MAX_ROWS)?;
        let previous = self.active_rows.swap(rows, Ordering::Relaxed);
        if rows < previous {
            self.memory.clear_rows(rows..previous);
            for row in &self.rows[rows..previous] {
                row.reset_outputs();
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(previous, rows, "sequencer_resize_rows");
        Ok(())
    }

    /// Sets the active step count. Steps that become inactive are cleared in
    /// every pattern.
    pub fn set_active_steps(&self, steps: usize) -> Result<(), ControlError> {
        check_dimension("step", steps, MAX_STEPS)?;
        let previous = self.active_steps.swap(steps, Ordering::Relaxed);
        if steps < previous {
            self.memory.clear_steps(steps..previous);
            let _ = self
                .selected
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                    (s >= steps).then_some(steps - 1)
                });
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(previous, steps, "sequencer_resize_steps");
        Ok(())
    }

    /// Activates one more row. Returns the new count.
    pub fn add_row(&self) -> Result<usize, ControlError> {
        let rows = self.active_rows() + 1;
        self.set_active_rows(rows)?;
        Ok(rows)
    }

    /// Deactivates the last row. Returns the new count.
    pub fn remove_row(&self) -> Result<usize, ControlError> {
        let rows = self.active_rows().saturating_sub(1);
        self.set_active_rows(rows)?;
        Ok(rows)
    }

    /// Activates one more step. Returns the new count.
    pub fn add_step(&self) -> Result<usize, ControlError> {
        let steps = self.active_steps() + 1;
        self.set_active_steps(steps)?;
        Ok(steps)
    }

    /// Deactivates the last step. Returns the new count.
    pub fn remove_step(&self) -> Result<usize, ControlError> {
        let steps = self.active_steps().saturating_sub(1);
        self.set_active_steps(steps)?;
        Ok(steps)
    }

    // --- rows ---

    /// Row `row`, active or not.
    pub fn row(&self, row: usize) -> Result<&Row, ControlError> {
        self.rows.get(row).ok_or(ControlError::RowOutOfRange {
            index: row,
            capacity: MAX_ROWS,
        })
    }

    /// Patchable output of row `row`.
    pub fn row_output(&self, row: usize) -> Result<SharedNode, ControlError> {
        Ok(self.row(row)?.output())
    }

    /// Switches a row between trigger and continuous output.
    pub fn set_row_mode(&self, row: usize, mode: RowMode) -> Result<(), ControlError> {
        let r = self.row(row)?;
        if r.mode() != mode {
            #[cfg(feature = "tracing")]
            tracing::debug!(row, ?mode, "sequencer_row_mode");
            r.set_mode(mode);
        }
        Ok(())
    }

    /// Mode of row `row`.
    pub fn row_mode(&self, row: usize) -> Result<RowMode, ControlError> {
        Ok(self.row(row)?.mode())
    }

    /// Mutes or unmutes a row. A muted row still advances but emits nothing.
    pub fn set_row_muted(&self, row: usize, muted: bool) -> Result<(), ControlError> {
        self.row(row)?.set_muted(muted);
        Ok(())
    }

    /// True if row `row` is muted.
    pub fn row_muted(&self, row: usize) -> Result<bool, ControlError> {
        Ok(self.row(row)?.is_muted())
    }

    /// Widget a grid cell shows, or `None` when the cell is outside the active
    /// rectangle.
    pub fn step_widget(&self, row: usize, step: usize) -> Option<StepWidget> {
        if row >= self.active_rows() || step >= self.active_steps() {
            return None;
        }
        self.rows.get(row).map(|r| r.mode().widget())
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockListener for StepSequencer {
    fn on_step(&self, tick: ClockTick) {
        self.advance(tick.external);
    }

    fn on_reset(&self) {
        self.rewind();
    }

    fn on_beat(&self, measure_phase: f32) {
        self.measure_phase.store(measure_phase);
    }
}

fn check_dimension(what: &'static str, requested: usize, max: usize) -> Result<(), ControlError> {
    if (1..=max).contains(&requested) {
        Ok(())
    } else {
        Err(ControlError::Dimension {
            what,
            requested,
            min: 1,
            max,
        })
    }
}
