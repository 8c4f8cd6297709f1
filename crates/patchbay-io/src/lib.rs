//! Sample I/O for patchbay.
//!
//! This crate provides:
//!
//! - **Clip loading**: [`read_clip`] decodes a WAV file into an interleaved
//!   [`Clip`](patchbay_core::Clip) ready for a clip player
//! - **WAV writing**: [`write_wav`] saves rendered interleaved output
//! - **Metadata**: [`read_wav_info`] reads the header without decoding samples
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use patchbay_core::{ClipPlayer, SessionContext};
//! use patchbay_io::{WavSpec, read_clip, write_wav};
//!
//! let player = ClipPlayer::new(Arc::new(SessionContext::new(48000.0)));
//! player.load_clip(read_clip("break.wav")?);
//!
//! let rendered = vec![0.0f32; 48000];
//! write_wav("out.wav", &rendered, WavSpec::default())?;
//! ```

mod wav;

use std::path::PathBuf;

pub use wav::{WavFormat, WavInfo, WavSpec, read_clip, read_samples, read_wav_info, write_wav};

/// Error types for sample I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The file decoded to zero frames.
    #[error("No sample data in {0}")]
    Empty(PathBuf),

    /// The decoded data was rejected as a clip.
    #[error("Invalid clip: {0}")]
    Clip(#[from] patchbay_core::ControlError),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for sample I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
