//! Session preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use patchbay_core::context::DEFAULT_BPM;
use patchbay_core::{ClipPlayer, ClockNode, SessionContext, StepSequencer};

use crate::clip::ClipPreset;
use crate::clock::ClockPreset;
use crate::error::ConfigError;
use crate::sequencer::SequencerPreset;
use crate::validation::validate_session;

/// Snapshot of one clock/sequencer/clip session.
///
/// Presets are stored as TOML files. They can be captured from live devices,
/// loaded from files, created programmatically, and applied back to devices.
///
/// # TOML Format
///
/// ```toml
/// name = "Shuffle"
/// description = "Swung sixteenths"
/// sample_rate = 48000
/// bpm = 96.0
///
/// [clock]
/// tempo_selector = 16
/// swing = 0.5
/// running = true
///
/// [sequencer]
/// active_rows = 1
/// active_steps = 8
///
/// [[sequencer.patterns]]
/// index = 0
/// gates = [[true, false, true, true, false, true, false, true]]
///
/// [clip]
/// source = "break.wav"
/// looping = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate hint (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Master tempo in BPM.
    #[serde(default = "default_bpm")]
    pub bpm: f32,

    /// Clock settings.
    #[serde(default)]
    pub clock: ClockPreset,

    /// Sequencer state.
    #[serde(default)]
    pub sequencer: SequencerPreset,

    /// Clip player settings, when the session has a player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipPreset>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_bpm() -> f32 {
    DEFAULT_BPM
}

impl SessionPreset {
    /// Create a new preset with default devices.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            bpm: DEFAULT_BPM,
            clock: ClockPreset::default(),
            sequencer: SequencerPreset::default(),
            clip: None,
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate hint.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the master tempo.
    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    /// Set the clock settings.
    pub fn with_clock(mut self, clock: ClockPreset) -> Self {
        self.clock = clock;
        self
    }

    /// Set the sequencer state.
    pub fn with_sequencer(mut self, sequencer: SequencerPreset) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Set the clip player settings.
    pub fn with_clip(mut self, clip: ClipPreset) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Captures the state of live devices.
    pub fn capture(
        name: impl Into<String>,
        session: &SessionContext,
        clock: &ClockNode,
        sequencer: &StepSequencer,
        clip: Option<&ClipPlayer>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: session.sample_rate() as u32,
            bpm: session.bpm(),
            clock: ClockPreset::capture(clock),
            sequencer: SequencerPreset::capture(sequencer),
            clip: clip.map(ClipPreset::capture),
        }
    }

    /// Validates the whole preset, then applies it to live devices.
    ///
    /// Nothing is written unless every part validates. The clip settings are
    /// applied only when both a player and clip settings are present.
    pub fn apply(
        &self,
        session: &SessionContext,
        clock: &ClockNode,
        sequencer: &StepSequencer,
        clip: Option<&ClipPlayer>,
    ) -> Result<(), ConfigError> {
        self.validate()?;
        tracing::debug!(name = %self.name, "applying session preset");
        session.set_bpm(self.bpm);
        self.sequencer.apply(sequencer)?;
        if let (Some(settings), Some(player)) = (&self.clip, clip) {
            settings.apply(player)?;
        }
        // Last, so a running clock restarts on a fully configured sequencer.
        self.clock.apply(clock)?;
        Ok(())
    }

    /// Checks every field against device limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(validate_session(self)?)
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset: SessionPreset = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), name = %preset.name, "loaded session preset");
        Ok(preset)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), "saved session preset");
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for SessionPreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::PatternPreset;

    #[test]
    fn test_preset_builder() {
        let preset = SessionPreset::new("Groove")
            .with_description("A test preset")
            .with_sample_rate(44100)
            .with_bpm(90.0)
            .with_clip(ClipPreset::default());

        assert_eq!(preset.name, "Groove");
        assert_eq!(preset.description.as_deref(), Some("A test preset"));
        assert_eq!(preset.sample_rate, 44100);
        assert_eq!(preset.bpm, 90.0);
        assert!(preset.clip.is_some());
    }

    #[test]
    fn test_minimal_toml() {
        let preset = SessionPreset::from_toml("name = \"Minimal\"").unwrap();
        assert_eq!(preset.name, "Minimal");
        assert_eq!(preset.sample_rate, 48000);
        assert_eq!(preset.bpm, DEFAULT_BPM);
        assert_eq!(preset.sequencer, SequencerPreset::default());
        assert!(preset.clip.is_none());
    }

    #[test]
    fn test_preset_from_toml() {
        let toml = r#"
name = "Shuffle"
bpm = 96.0

[clock]
tempo_selector = 16
swing = 0.5

[sequencer]
active_rows = 1
active_steps = 4

[[sequencer.rows]]
mode = "continuous"

[[sequencer.patterns]]
index = 2
levels = [[0.0, 0.5, 1.0, 0.5]]

[clip]
source = "break.wav"
looping = true
"#;
        let preset = SessionPreset::from_toml(toml).unwrap();
        assert_eq!(preset.clock.tempo_selector, 16);
        assert_eq!(preset.sequencer.active_steps, 4);
        assert_eq!(
            preset.sequencer.pattern(2).map(|p| p.levels[0].clone()),
            Some(vec![0.0, 0.5, 1.0, 0.5])
        );
        let clip = preset.clip.unwrap();
        assert!(clip.looping);
        assert_eq!(clip.speed, 1.0);
    }

    #[test]
    fn test_preset_roundtrip() {
        let original = SessionPreset::new("Roundtrip").with_sequencer(SequencerPreset {
            active_rows: 2,
            active_steps: 3,
            patterns: vec![PatternPreset {
                index: 0,
                gates: vec![vec![true, false, true], vec![false, true, false]],
                levels: Vec::new(),
            }],
            ..SequencerPreset::default()
        });
        let parsed = SessionPreset::from_toml(&original.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_invalid_preset_is_rejected() {
        let mut preset = SessionPreset::default();
        preset.sequencer.active_steps = 0;
        assert!(matches!(preset.validate(), Err(ConfigError::Validation(_))));
    }
}
