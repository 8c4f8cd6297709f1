//! Integration tests for patchbay-io.
//!
//! Clips are decoded from disk, played through the engine and the output is
//! written back out as a WAV file.

use std::sync::Arc;

use patchbay_core::{ClipPlayer, Engine, SessionContext};
use patchbay_io::{WavSpec, read_clip, read_samples, read_wav_info, write_wav};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Stereo ramp: left counts up, right counts down.
fn stereo_ramp(frames: usize) -> Vec<f32> {
    (0..frames)
        .flat_map(|i| {
            let x = i as f32 / frames as f32;
            [x * 0.5, -x * 0.5]
        })
        .collect()
}

// ============================================================================
// Clip loading and rendering
// ============================================================================

/// A clip read from disk plays at unit speed and sounds like the file.
#[test]
fn test_loaded_clip_renders_file_contents() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("ramp.wav");
    let spec = WavSpec::float(2, 48000);
    write_wav(&source, &stereo_ramp(8192), spec).unwrap();

    let session = Arc::new(SessionContext::new(48000.0));
    let player = Arc::new(ClipPlayer::new(session.clone()));
    player.load_clip(read_clip(&source).unwrap());
    player.play();

    let engine = Engine::new(session);
    engine.connect_root(player.clone());

    let mut rendered = Vec::new();
    let mut block = vec![0.0; 512 * 2];
    for _ in 0..4 {
        engine.render(&mut block, 2);
        rendered.extend_from_slice(&block);
    }

    assert!(rendered.iter().all(|s| s.is_finite()));
    // Left channel is non-negative, right channel is non-positive.
    for frame in rendered.chunks_exact(2) {
        assert!(frame[0] >= 0.0);
        assert!(frame[1] <= 0.0);
    }
    assert!(rendered.iter().any(|&s| s != 0.0));

    let output = temp.path().join("out.wav");
    write_wav(&output, &rendered, spec).unwrap();

    let info = read_wav_info(&output).unwrap();
    assert_eq!(info.spec.channels, 2);
    assert_eq!(info.frames, 2048);

    let (loaded, loaded_spec) = read_samples(&output).unwrap();
    assert_eq!(loaded_spec, spec);
    assert_eq!(loaded, rendered);
}

/// A file shorter than the bound padding loads but renders silence.
#[test]
fn test_short_clip_renders_silence() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("blip.wav");
    write_wav(&source, &[0.5; 100], WavSpec::default()).unwrap();

    let clip = read_clip(&source).unwrap();
    assert_eq!(clip.frames(), 100);

    let session = Arc::new(SessionContext::new(48000.0));
    let player = Arc::new(ClipPlayer::new(session.clone()));
    player.load_clip(clip);
    player.play();

    let engine = Engine::new(session);
    engine.connect_root(player);
    let mut block = vec![1.0; 256];
    engine.render(&mut block, 1);
    assert!(block.iter().all(|&s| s == 0.0));
}

/// Reading a file that does not exist is an error, not a panic.
#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    assert!(read_clip(temp.path().join("absent.wav")).is_err());
}
