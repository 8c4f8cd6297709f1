//! Preset management commands.
//!
//! Provides commands to list, show, validate and create session presets.

use crate::commands::common::load_preset;
use clap::{Args, Subcommand};
use patchbay_config::{
    ClipPreset, RowModeSetting, SessionPreset, factory_preset_names, get_factory_preset,
};
use patchbay_core::StepDivision;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets
    List,

    /// Show details of a preset
    Show {
        /// Preset name or path
        name: String,
    },

    /// Check a preset file against device limits
    Validate {
        /// Path to the preset file
        path: PathBuf,
    },

    /// Write a new preset file, optionally starting from an existing preset
    Create {
        /// Output TOML file
        output: PathBuf,

        /// Preset name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Preset to start from
        #[arg(long, default_value = "init")]
        from: String,

        /// Description of the preset
        #[arg(short, long)]
        description: Option<String>,

        /// Tempo in BPM
        #[arg(long)]
        bpm: Option<f32>,

        /// Step division selector (1, 2, 4, 8, 16 or 32)
        #[arg(long)]
        division: Option<u32>,

        /// Swing amount
        #[arg(long)]
        swing: Option<f32>,

        /// Clip file the host should load
        #[arg(long, value_name = "WAV")]
        clip: Option<PathBuf>,

        /// Overwrite if the file already exists
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List => list_presets(),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Validate { path } => validate_preset(&path),
        PresetsCommand::Create {
            output,
            name,
            from,
            description,
            bpm,
            division,
            swing,
            clip,
            force,
        } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    output.display()
                );
            }
            let name = name.unwrap_or_else(|| {
                output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("untitled")
                    .to_string()
            });

            let mut preset = load_preset(&from)?;
            preset.name = name;
            if let Some(desc) = description {
                preset.description = Some(desc);
            }
            if let Some(bpm) = bpm {
                preset.bpm = bpm;
            }
            if let Some(division) = division {
                preset.clock.tempo_selector = division;
            }
            if let Some(swing) = swing {
                preset.clock.swing = swing;
            }
            if let Some(clip) = clip {
                preset.clip = Some(preset.clip.unwrap_or_default().with_source(clip));
            }

            preset.validate()?;
            preset.save(&output)?;
            tracing::info!(path = %output.display(), "preset written");
            println!("Created preset '{}' at {}", preset.name, output.display());
            Ok(())
        }
    }
}

fn list_presets() -> anyhow::Result<()> {
    println!("Factory Presets:");
    println!("================");
    for id in factory_preset_names() {
        let Some(preset) = get_factory_preset(id) else {
            continue;
        };
        let desc = preset.description.as_deref().unwrap_or("");
        println!("  {:20} {:20} - {}", id, preset.name, desc);
    }
    println!();
    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = load_preset(name)?;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    println!();

    if let Some(desc) = &preset.description {
        println!("Description: {}", desc);
        println!();
    }

    println!("Sample Rate: {} Hz", preset.sample_rate);
    println!("Tempo:       {} BPM", preset.bpm);
    println!();

    let clock = &preset.clock;
    let division = StepDivision::from_selector(clock.tempo_selector)
        .map_or_else(|| "invalid".to_string(), |d| format!("1/{}", d.selector()));
    println!("Clock:");
    println!("  division    {division}");
    println!("  swing       {} (depth {})", clock.swing, clock.swing_depth);
    println!("  master      {}", clock.master_mode);
    println!("  running     {}", clock.running);
    println!();

    let seq = &preset.sequencer;
    println!(
        "Sequencer: {} rows x {} steps, pattern {}",
        seq.active_rows, seq.active_steps, seq.pattern
    );
    for pattern in &seq.patterns {
        println!("  pattern {}:", pattern.index);
        for row in 0..seq.active_rows {
            let mode = seq.rows.get(row).map_or(RowModeSetting::Trigger, |r| r.mode);
            let cells: String = (0..seq.active_steps)
                .map(|step| match mode {
                    RowModeSetting::Trigger => {
                        let on = pattern
                            .gates
                            .get(row)
                            .and_then(|gates| gates.get(step))
                            .copied()
                            .unwrap_or(false);
                        if on { 'x' } else { '.' }
                    }
                    RowModeSetting::Continuous => {
                        let level = pattern
                            .levels
                            .get(row)
                            .and_then(|levels| levels.get(step))
                            .copied()
                            .unwrap_or(0.0);
                        level_glyph(level)
                    }
                })
                .collect();
            println!("    {row:2} {cells}");
        }
    }
    println!();

    if let Some(clip) = &preset.clip {
        print_clip(clip);
    }

    Ok(())
}

fn level_glyph(level: f32) -> char {
    const GLYPHS: [char; 5] = ['_', '.', '-', '=', '#'];
    let index = (level.clamp(0.0, 1.0) * (GLYPHS.len() - 1) as f32).round() as usize;
    GLYPHS[index.min(GLYPHS.len() - 1)]
}

fn print_clip(clip: &ClipPreset) {
    println!("Clip:");
    match &clip.source {
        Some(source) => println!("  source      {}", source.display()),
        None => println!("  source      (none)"),
    }
    println!("  speed       {}", clip.speed);
    println!("  amplitude   {}", clip.amplitude);
    println!("  bounds      {} .. {}", clip.head, clip.tail);
    println!("  looping     {}", clip.looping);
    println!("  reverse     {}", clip.reverse);
    println!("  window      {} frames", clip.window);
}

fn validate_preset(path: &Path) -> anyhow::Result<()> {
    let preset = SessionPreset::load(path)?;
    preset.validate()?;
    println!("{}: '{}' is valid", path.display(), preset.name);
    Ok(())
}
