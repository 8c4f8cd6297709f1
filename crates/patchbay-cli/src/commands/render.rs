//! Offline render command.

use crate::commands::common::{load_preset, resolve_source};
use crate::scene::{Monitor, Scene, pluck};
use anyhow::Context;
use clap::Args;
use patchbay_io::{WavSpec, read_clip, write_wav};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Session preset: factory name or path to a TOML file
    #[arg(short, long, default_value = "four_on_the_floor")]
    preset: String,

    /// Clip to load into the player (overrides the preset's source)
    #[arg(short, long, value_name = "WAV")]
    clip: Option<PathBuf>,

    /// Duration in seconds
    #[arg(short, long, default_value = "4.0")]
    duration: f32,

    /// Override the preset tempo
    #[arg(long)]
    bpm: Option<f32>,

    /// Sample rate (defaults to the preset's)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Frames per audio callback
    #[arg(long, default_value = "512")]
    buffer_size: usize,

    /// Output channel count
    #[arg(long, default_value = "2")]
    channels: u16,

    /// Output bit depth (16, 24 or 32 for float)
    #[arg(long, default_value = "32")]
    bits: u16,

    /// Write the raw output of this sequencer row instead of clip audio
    #[arg(long, value_name = "ROW")]
    row: Option<usize>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !(args.duration.is_finite() && args.duration > 0.0) {
        anyhow::bail!("Duration must be a positive number of seconds");
    }
    if args.channels == 0 {
        anyhow::bail!("Channel count must be at least 1");
    }
    if !matches!(args.bits, 16 | 24 | 32) {
        anyhow::bail!("Unsupported bit depth {} (use 16, 24 or 32)", args.bits);
    }

    let mut preset = load_preset(&args.preset)?;
    if let Some(bpm) = args.bpm {
        preset.bpm = bpm;
    }
    let sample_rate = args.sample_rate.unwrap_or(preset.sample_rate);
    if sample_rate == 0 {
        anyhow::bail!("Sample rate must be positive");
    }

    let scene = Scene::new(sample_rate)?;

    let source = args.clip.clone().or_else(|| {
        preset
            .clip
            .as_ref()
            .and_then(|clip| clip.source.as_deref())
            .map(|source| resolve_source(source, &args.preset))
    });
    let clip = match &source {
        Some(path) => {
            read_clip(path).with_context(|| format!("failed to load clip {}", path.display()))?
        }
        None => {
            tracing::info!("no clip given, using the built-in pluck");
            pluck(sample_rate)?
        }
    };
    scene.player.load_clip(clip);

    scene
        .apply(&preset)
        .with_context(|| format!("failed to apply preset '{}'", preset.name))?;
    if let Some(row) = args.row {
        scene.monitor(Monitor::Row(row))?;
    }

    let frames = (args.duration * sample_rate as f32) as usize;
    tracing::info!(
        preset = %preset.name,
        bpm = preset.bpm,
        sample_rate,
        frames,
        buffer_size = args.buffer_size,
        "rendering"
    );

    let samples = scene.render(frames, usize::from(args.channels), args.buffer_size);

    let spec = WavSpec {
        channels: args.channels,
        sample_rate,
        bits_per_sample: args.bits,
    };
    write_wav(&args.output, &samples, spec)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let peak = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    tracing::info!(
        steps = scene.clock.tick_count(),
        restarts = scene.sequencer.restarts(),
        peak,
        "render complete"
    );
    println!(
        "Rendered {:.2}s of '{}' to {}",
        args.duration,
        preset.name,
        args.output.display()
    );

    Ok(())
}
