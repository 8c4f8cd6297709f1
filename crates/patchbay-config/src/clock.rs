//! Beat clock snapshot.

use serde::{Deserialize, Serialize};

use patchbay_core::{ClockNode, DEFAULT_SWING_DEPTH, StepDivision};

use crate::error::ConfigError;
use crate::validation::validate_clock;

/// Persisted clock settings.
///
/// ```toml
/// [clock]
/// tempo_selector = 16
/// swing = 0.4
/// running = true
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockPreset {
    /// Note denominator of one step: 1, 2, 4, 8, 16 or 32.
    pub tempo_selector: u32,
    /// Swing amount in `[0, MAX_SWING]`.
    pub swing: f32,
    /// Fraction of a step that full swing shifts.
    pub swing_depth: f32,
    /// Follow the external clock input when one is patched.
    pub master_mode: bool,
    /// Start the clock when the preset is applied.
    pub running: bool,
}

impl Default for ClockPreset {
    fn default() -> Self {
        Self {
            tempo_selector: StepDivision::Quarter.selector(),
            swing: 0.0,
            swing_depth: DEFAULT_SWING_DEPTH,
            master_mode: false,
            running: false,
        }
    }
}

impl ClockPreset {
    /// Reads the current settings of a live clock.
    pub fn capture(clock: &ClockNode) -> Self {
        Self {
            tempo_selector: clock.division().selector(),
            swing: clock.swing(),
            swing_depth: clock.swing_depth(),
            master_mode: clock.master_mode(),
            running: clock.is_running(),
        }
    }

    /// Step division named by the tempo selector.
    pub fn division(&self) -> Option<StepDivision> {
        StepDivision::from_selector(self.tempo_selector)
    }

    /// Validates, then writes the settings into a live clock.
    ///
    /// A running clock is toggled on again, which resets it to step 0.
    pub fn apply(&self, clock: &ClockNode) -> Result<(), ConfigError> {
        validate_clock(self)?;
        clock.set_tempo_selector(self.tempo_selector)?;
        clock.set_swing(self.swing);
        clock.set_swing_depth(self.swing_depth);
        clock.set_master_mode(self.master_mode);
        clock.toggle_run(self.running);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::SessionContext;
    use std::sync::Arc;

    fn clock() -> ClockNode {
        ClockNode::new(Arc::new(SessionContext::default()))
    }

    #[test]
    fn capture_apply_round_trip() {
        let source = clock();
        source.set_division(StepDivision::Sixteenth);
        source.set_swing(0.4);
        source.set_master_mode(true);
        source.toggle_run(true);

        let preset = ClockPreset::capture(&source);
        assert_eq!(preset.tempo_selector, 16);
        assert_eq!(preset.division(), Some(StepDivision::Sixteenth));

        let target = clock();
        preset.apply(&target).unwrap();
        assert_eq!(ClockPreset::capture(&target), preset);
    }

    #[test]
    fn invalid_preset_leaves_clock_untouched() {
        let target = clock();
        let preset = ClockPreset {
            tempo_selector: 8,
            swing: 2.0,
            ..ClockPreset::default()
        };
        assert!(matches!(preset.apply(&target), Err(ConfigError::Validation(_))));
        assert_eq!(target.division(), StepDivision::Quarter);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let preset: ClockPreset = toml::from_str("swing = 0.25").unwrap();
        assert_eq!(preset.swing, 0.25);
        assert_eq!(preset.tempo_selector, 4);
        assert!(!preset.running);
    }
}
