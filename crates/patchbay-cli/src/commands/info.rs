//! Show WAV header details and whether the file can be loaded as a clip.

use clap::Args;
use patchbay_core::BOUND_PADDING;
use patchbay_io::{WavFormat, read_wav_info};
use std::path::PathBuf;

#[derive(Args)]
pub struct InfoArgs {
    /// WAV file to inspect
    file: PathBuf,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.file)?;
    let spec = info.spec;

    let encoding = match info.format {
        WavFormat::Pcm => "PCM",
        WavFormat::IeeeFloat => "IEEE Float",
    };

    println!("File:        {}", args.file.display());
    println!("Format:      {encoding} {}-bit", spec.bits_per_sample);
    println!("Channels:    {}", spec.channels);
    println!("Sample Rate: {} Hz", spec.sample_rate);
    println!("Length:      {} frames ({:.3}s)", info.frames, info.duration_secs());
    if info.is_playable() {
        println!("Playable:    yes");
    } else {
        println!("Playable:    no (shorter than {BOUND_PADDING} frames)");
    }

    Ok(())
}
