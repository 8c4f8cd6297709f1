//! Clip player snapshot.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use patchbay_core::ClipPlayer;

use crate::error::ConfigError;
use crate::validation::validate_clip;

/// Persisted clip player settings.
///
/// The sample data itself is not stored; `source` names the file the host
/// should load into the player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClipPreset {
    /// Sample file to load, relative to the preset file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Playback speed; negative values play backwards.
    pub speed: f32,
    /// Output amplitude.
    pub amplitude: f32,
    /// Loop between the bounds.
    pub looping: bool,
    /// Play backwards.
    pub reverse: bool,
    /// Head bound as a fraction of the clip length.
    pub head: f32,
    /// Tail bound as a fraction of the clip length.
    pub tail: f32,
    /// Fade window at the bounds, in frames.
    pub window: usize,
    /// Start playback when the preset is applied.
    pub playing: bool,
}

impl Default for ClipPreset {
    fn default() -> Self {
        Self {
            source: None,
            speed: 1.0,
            amplitude: 1.0,
            looping: false,
            reverse: false,
            head: 0.0,
            tail: 1.0,
            window: 0,
            playing: false,
        }
    }
}

impl ClipPreset {
    /// Reads the current settings of a live player. `source` is left empty.
    pub fn capture(player: &ClipPlayer) -> Self {
        let (head, tail) = player.manual_bounds();
        Self {
            source: None,
            speed: player.speed(),
            amplitude: player.amplitude(),
            looping: player.looping(),
            reverse: player.reverse(),
            head,
            tail,
            window: player.window(),
            playing: player.is_playing(),
        }
    }

    /// Builder-style sample file.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Validates, then writes the settings into a live player. The player
    /// is started or stopped according to `playing`.
    pub fn apply(&self, player: &ClipPlayer) -> Result<(), ConfigError> {
        validate_clip(self)?;
        player.set_speed(self.speed);
        player.set_amplitude(self.amplitude);
        player.set_looping(self.looping);
        player.set_reverse(self.reverse);
        player.set_bounds(self.head, self.tail);
        player.set_window(self.window);
        if self.playing {
            player.play();
        } else {
            player.stop();
        }
        Ok(())
    }
}
