//! Factory session presets bundled with the library.
//!
//! Embedded TOML, always available without external files. They double as
//! starting points for the CLI's demo render.

use crate::SessionPreset;

/// TOML content for factory presets, keyed by identifier.
static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("four_on_the_floor", FOUR_ON_THE_FLOOR_PRESET),
    ("shuffle", SHUFFLE_PRESET),
    ("slow_ramp", SLOW_RAMP_PRESET),
];

/// Empty grid, stopped clock.
const INIT_PRESET: &str = r#"
name = "Init"
description = "Empty pattern, quarter-note clock"
"#;

const FOUR_ON_THE_FLOOR_PRESET: &str = r#"
name = "Four on the Floor"
description = "Straight sixteenths with a hit on every beat"
bpm = 124.0

[clock]
tempo_selector = 16
running = true

[sequencer]
active_rows = 2
active_steps = 16

[[sequencer.patterns]]
index = 0
gates = [
    [true, false, false, false, true, false, false, false, true, false, false, false, true, false, false, false],
    [false, false, true, false, false, false, true, false, false, false, true, false, false, false, true, false],
]

[clip]
looping = false
"#;

const SHUFFLE_PRESET: &str = r#"
name = "Shuffle"
description = "Swung sixteenths"
bpm = 96.0

[clock]
tempo_selector = 16
swing = 0.6
running = true

[sequencer]
active_rows = 1
active_steps = 8

[[sequencer.patterns]]
index = 0
gates = [[true, false, true, true, false, true, true, false]]

[clip]
speed = 1.5
"#;

const SLOW_RAMP_PRESET: &str = r#"
name = "Slow Ramp"
description = "Continuous row stepping through levels on eighth notes"
bpm = 80.0

[clock]
tempo_selector = 8
running = true

[sequencer]
active_rows = 1
active_steps = 8

[[sequencer.rows]]
mode = "continuous"

[[sequencer.patterns]]
index = 0
levels = [[0.0, 0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875]]

[clip]
looping = true
window = 256
"#;

/// Returns all factory presets.
pub fn factory_presets() -> Vec<SessionPreset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| SessionPreset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by identifier or display name (case-insensitive).
pub fn get_factory_preset(name: &str) -> Option<SessionPreset> {
    let name_lower = name.to_lowercase();

    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(id, toml)| Some((*id, SessionPreset::from_toml(toml).ok()?)))
        .find(|(id, preset)| *id == name_lower || preset.name.to_lowercase() == name_lower)
        .map(|(_, preset)| preset)
}

/// Get the identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_factory_preset_parses_and_validates() {
        let presets = factory_presets();
        assert_eq!(presets.len(), FACTORY_PRESETS_TOML.len());
        for preset in &presets {
            assert!(
                preset.validate().is_ok(),
                "factory preset '{}' failed validation: {:?}",
                preset.name,
                preset.validate()
            );
        }
    }

    #[test]
    fn lookup_by_id_or_name() {
        assert_eq!(get_factory_preset("shuffle").unwrap().clock.tempo_selector, 16);
        assert_eq!(get_factory_preset("Four on the Floor").unwrap().bpm, 124.0);
        assert!(get_factory_preset("SLOW_RAMP").is_some());
        assert!(get_factory_preset("missing").is_none());
    }

    #[test]
    fn names_list() {
        assert_eq!(factory_preset_names()[0], "init");
    }
}
