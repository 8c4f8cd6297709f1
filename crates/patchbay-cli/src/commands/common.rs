//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use patchbay_config::{SessionPreset, get_factory_preset};
use std::path::{Path, PathBuf};

/// Load a session preset by factory name or file path.
///
/// Factory presets win over files with the same name.
pub fn load_preset(name: &str) -> anyhow::Result<SessionPreset> {
    if let Some(preset) = get_factory_preset(name) {
        return Ok(preset);
    }

    let path = PathBuf::from(name);
    if path.exists() {
        return SessionPreset::load(&path)
            .with_context(|| format!("failed to load preset {}", path.display()));
    }

    anyhow::bail!(
        "Preset '{}' not found. Use 'patchbay presets list' to see available presets.",
        name
    )
}

/// Resolves a clip source named in a preset file against the file's directory.
pub fn resolve_source(source: &Path, preset_name: &str) -> PathBuf {
    if source.is_absolute() {
        return source.to_path_buf();
    }
    Path::new(preset_name)
        .parent()
        .filter(|dir| Path::new(preset_name).exists() && !dir.as_os_str().is_empty())
        .map_or_else(|| source.to_path_buf(), |dir| dir.join(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_names_resolve() {
        assert_eq!(load_preset("shuffle").unwrap().name, "Shuffle");
        assert!(load_preset("definitely/not/here.toml").is_err());
    }

    #[test]
    fn relative_sources_follow_the_preset_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let preset = dir.path().join("groove.toml");
        std::fs::write(&preset, "name = \"g\"").unwrap();

        let resolved = resolve_source(Path::new("kick.wav"), preset.to_str().unwrap());
        assert_eq!(resolved, dir.path().join("kick.wav"));

        let factory = resolve_source(Path::new("kick.wav"), "shuffle");
        assert_eq!(factory, PathBuf::from("kick.wav"));
    }
}
