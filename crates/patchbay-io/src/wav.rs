//! WAV file reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use patchbay_core::{BOUND_PADDING, Clip};
use std::path::Path;

/// Sample encoding stored in a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Integer PCM.
    Pcm,
    /// 32-bit IEEE float.
    IeeeFloat,
}

/// Channel layout, rate and bit depth of a WAV file.
///
/// A 32-bit spec is written as float; any other depth is written as integer
/// PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
}

impl WavSpec {
    /// 32-bit float at `sample_rate`.
    pub fn float(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 32,
        }
    }

    /// Integer PCM at `bits` per sample.
    pub fn pcm(channels: u16, sample_rate: u32, bits: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: bits,
        }
    }

    /// Encoding this spec writes.
    pub fn format(&self) -> WavFormat {
        if self.bits_per_sample == 32 {
            WavFormat::IeeeFloat
        } else {
            WavFormat::Pcm
        }
    }

    fn to_hound(self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: match self.format() {
                WavFormat::IeeeFloat => SampleFormat::Float,
                WavFormat::Pcm => SampleFormat::Int,
            },
        }
    }
}

impl Default for WavSpec {
    /// Mono float at 48 kHz.
    fn default() -> Self {
        Self::float(1, 48000)
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self::pcm(spec.channels, spec.sample_rate, spec.bits_per_sample)
    }
}

/// Header of a WAV file, read without decoding samples.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Layout and depth.
    pub spec: WavSpec,
    /// Encoding as stored in the header.
    pub format: WavFormat,
    /// Length in frames.
    pub frames: u64,
}

impl WavInfo {
    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / f64::from(self.spec.sample_rate.max(1))
    }

    /// Whether a clip player can play the file: it must hold at least
    /// [`BOUND_PADDING`] frames.
    pub fn is_playable(&self) -> bool {
        self.frames >= BOUND_PADDING as u64
    }
}

/// Reads the header of the WAV file at `path`.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let header = reader.spec();
    let format = match header.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };
    Ok(WavInfo {
        spec: WavSpec::from(header),
        format,
        frames: u64::from(reader.len()) / u64::from(header.channels.max(1)),
    })
}

/// Read a WAV file as interleaved f32 samples in `[-1, 1]` along with the spec.
///
/// Unlike a mixdown, every channel is kept so stereo clips play in stereo.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);

    let samples: Vec<f32> = match hound_spec.sample_format {
        SampleFormat::Float if spec.bits_per_sample == 32 => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int if (8..=32).contains(&spec.bits_per_sample) => {
            let full_scale = pcm_full_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        format => {
            return Err(Error::UnsupportedFormat(format!(
                "{format:?} at {} bits",
                spec.bits_per_sample
            )));
        }
    };

    Ok((samples, spec))
}

#[inline]
fn pcm_full_scale(bits: u16) -> f32 {
    (1i64 << (bits - 1)) as f32
}

/// Decode a WAV file into a [`Clip`].
///
/// Files shorter than [`BOUND_PADDING`] frames load, but a clip player renders
/// them as silence; a warning is logged.
pub fn read_clip<P: AsRef<Path>>(path: P) -> Result<Clip> {
    let path = path.as_ref();
    let (samples, spec) = read_samples(path)?;
    if samples.is_empty() {
        return Err(Error::Empty(path.to_path_buf()));
    }

    let clip = Clip::new(samples, usize::from(spec.channels), spec.sample_rate as f32)?;
    if clip.frames() < BOUND_PADDING {
        tracing::warn!(
            path = %path.display(),
            frames = clip.frames(),
            min_frames = BOUND_PADDING,
            "clip is too short to play"
        );
    } else {
        tracing::info!(
            path = %path.display(),
            frames = clip.frames(),
            channels = clip.channels(),
            sample_rate = spec.sample_rate,
            "loaded clip"
        );
    }
    Ok(clip)
}

/// Writes interleaved `samples` to `path`. PCM output is clipped to full
/// scale.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    if spec.channels == 0 || !(8..=32).contains(&spec.bits_per_sample) {
        return Err(Error::UnsupportedFormat(format!(
            "{} channels at {} bits",
            spec.channels, spec.bits_per_sample
        )));
    }
    let mut writer = WavWriter::create(path, spec.to_hound())?;

    match spec.format() {
        WavFormat::IeeeFloat => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
        WavFormat::Pcm => {
            let full_scale = pcm_full_scale(spec.bits_per_sample);
            for &sample in samples {
                let quantized = (sample * full_scale).clamp(-full_scale, full_scale - 1.0);
                writer.write_sample(quantized as i32)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}
