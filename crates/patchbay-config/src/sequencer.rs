//! Step sequencer snapshot: dimensions, row settings and pattern grids.

use serde::{Deserialize, Serialize};

use patchbay_core::sequencer::{DEFAULT_ROWS, DEFAULT_STEPS};
use patchbay_core::{MAX_PATTERNS, RowMode, StepSequencer, StepValue};

use crate::error::ConfigError;
use crate::validation::validate_sequencer;

/// Row mode as written in preset files.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowModeSetting {
    /// Pulse on steps whose gate is set.
    #[default]
    Trigger,
    /// Hold each step's level.
    Continuous,
}

impl From<RowMode> for RowModeSetting {
    fn from(mode: RowMode) -> Self {
        match mode {
            RowMode::Trigger => RowModeSetting::Trigger,
            RowMode::Continuous => RowModeSetting::Continuous,
        }
    }
}

impl From<RowModeSetting> for RowMode {
    fn from(mode: RowModeSetting) -> Self {
        match mode {
            RowModeSetting::Trigger => RowMode::Trigger,
            RowModeSetting::Continuous => RowMode::Continuous,
        }
    }
}

/// Per-row settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RowPreset {
    /// Trigger or continuous output.
    pub mode: RowModeSetting,
    /// Skip emission while advancing.
    pub muted: bool,
}

/// One stored pattern, trimmed to the active rows and steps.
///
/// `gates[row][step]` and `levels[row][step]`; missing rows or steps are off
/// and at zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatternPreset {
    /// Pattern slot in `0..MAX_PATTERNS`.
    pub index: usize,
    /// Gate flags per row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gates: Vec<Vec<bool>>,
    /// Levels in `[0, 1]` per row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<Vec<f32>>,
}

impl PatternPreset {
    /// True when no gate is set and every level is zero.
    pub fn is_blank(&self) -> bool {
        self.gates.iter().flatten().all(|&on| !on) && self.levels.iter().flatten().all(|&v| v == 0.0)
    }
}

/// Persisted sequencer state.
///
/// ```toml
/// [sequencer]
/// active_rows = 2
/// active_steps = 8
///
/// [[sequencer.rows]]
/// mode = "trigger"
///
/// [[sequencer.rows]]
/// mode = "continuous"
/// muted = true
///
/// [[sequencer.patterns]]
/// index = 0
/// gates = [[true, false, false, false, true, false, false, false]]
/// levels = [[], [0.0, 0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25]]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SequencerPreset {
    /// Active row count.
    pub active_rows: usize,
    /// Active step count.
    pub active_steps: usize,
    /// Pattern selected for playback.
    pub pattern: usize,
    /// Settings for the first `rows.len()` rows; the rest use defaults.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<RowPreset>,
    /// Non-blank patterns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternPreset>,
}

impl Default for SequencerPreset {
    fn default() -> Self {
        Self {
            active_rows: DEFAULT_ROWS,
            active_steps: DEFAULT_STEPS,
            pattern: 0,
            rows: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl SequencerPreset {
    /// Reads dimensions, row settings and every non-blank pattern from a live
    /// sequencer.
    pub fn capture(seq: &StepSequencer) -> Self {
        let active_rows = seq.active_rows();
        let active_steps = seq.active_steps();
        let rows = (0..active_rows)
            .filter_map(|r| seq.row(r).ok())
            .map(|row| RowPreset {
                mode: row.mode().into(),
                muted: row.is_muted(),
            })
            .collect();

        let memory = seq.memory();
        let patterns = (0..MAX_PATTERNS)
            .map(|index| {
                let cells = |r: usize| (0..active_steps).filter_map(move |s| memory.cell(index, r, s));
                PatternPreset {
                    index,
                    gates: (0..active_rows)
                        .map(|r| cells(r).map(|c| c.is_on()).collect())
                        .collect(),
                    levels: (0..active_rows)
                        .map(|r| cells(r).map(|c| c.value()).collect())
                        .collect(),
                }
            })
            .filter(|p| !p.is_blank())
            .collect();

        Self {
            active_rows,
            active_steps,
            pattern: seq.pattern(),
            rows,
            patterns,
        }
    }

    /// Looks up a stored pattern.
    pub fn pattern(&self, index: usize) -> Option<&PatternPreset> {
        self.patterns.iter().find(|p| p.index == index)
    }

    /// Validates, then replaces the live sequencer's state with this snapshot.
    ///
    /// Every pattern not in the snapshot is cleared.
    pub fn apply(&self, seq: &StepSequencer) -> Result<(), ConfigError> {
        validate_sequencer(self)?;
        seq.set_active_rows(self.active_rows)?;
        seq.set_active_steps(self.active_steps)?;

        for index in 0..MAX_PATTERNS {
            seq.clear_pattern(index)?;
        }
        for pattern in &self.patterns {
            for (r, gates) in pattern.gates.iter().enumerate() {
                for (s, &on) in gates.iter().enumerate() {
                    seq.set_step(pattern.index, r, s, StepValue::Gate(on))?;
                }
            }
            for (r, levels) in pattern.levels.iter().enumerate() {
                for (s, &level) in levels.iter().enumerate() {
                    seq.set_step(pattern.index, r, s, StepValue::Level(level))?;
                }
            }
        }

        for r in 0..self.active_rows {
            let row = self.rows.get(r).copied().unwrap_or_default();
            seq.set_row_mode(r, row.mode.into())?;
            seq.set_row_muted(r, row.muted)?;
        }
        seq.select_pattern(self.pattern)?;
        Ok(())
    }
}
