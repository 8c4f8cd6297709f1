//! Property-based tests for patchbay-core.
//!
//! Tests render termination on cyclic patches, sequencer wrap behaviour,
//! trigger idempotence, playback bounds and determinism using proptest for
//! randomized input generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use proptest::prelude::*;
use patchbay_core::{
    AudioNode, BOUND_PADDING, BeatClock, Bounds, Clip, ClipPlayer, ClockParams, DEFAULT_SWING_DEPTH,
    MixerNode, RenderContext, SessionContext, StepSequencer, TriggerNode, ValueNode,
};

const SAMPLE_RATE: f32 = 48000.0;

/// A normalized bound value that is sometimes out of range or not finite.
fn bound_value() -> impl Strategy<Value = f32> {
    prop_oneof![
        6 => -0.5f32..1.5f32,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
        1 => any::<f32>(),
    ]
}

/// Mono clip of `frames` frames holding a deterministic waveform.
fn test_clip(frames: usize) -> Clip {
    let samples = (0..frames)
        .map(|i| libm::sinf(i as f32 * 0.013) * 0.8)
        .collect();
    Clip::new(samples, 1, SAMPLE_RATE).unwrap()
}

/// Player settings applied identically to every instance under test.
#[derive(Debug, Clone, Copy)]
struct PlayerSettings {
    speed: f32,
    head: f32,
    tail: f32,
    looping: bool,
    reverse: bool,
}

fn player_settings() -> impl Strategy<Value = PlayerSettings> {
    (-4.0f32..4.0f32, bound_value(), bound_value(), any::<bool>(), any::<bool>()).prop_map(
        |(speed, head, tail, looping, reverse)| PlayerSettings {
            speed,
            head,
            tail,
            looping,
            reverse,
        },
    )
}

fn configured_player(clip: &Arc<Clip>, settings: PlayerSettings) -> ClipPlayer {
    let player = ClipPlayer::new(Arc::new(SessionContext::new(SAMPLE_RATE)));
    player.load_shared(Arc::clone(clip));
    player.set_speed(settings.speed);
    player.set_bounds(settings.head, settings.tail);
    player.set_looping(settings.looping);
    player.set_reverse(settings.reverse);
    player.play();
    player
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A ring of mixers, each fed by a constant and by the next mixer, always
    /// finishes rendering with finite output and releases every guard.
    #[test]
    fn cyclic_patch_terminates(
        ring in 1usize..6,
        gains in prop::collection::vec(-1.0f32..=1.0f32, 6),
        dc in -1.0f32..=1.0f32,
        len in 1usize..512,
    ) {
        let mixers: Vec<Arc<MixerNode>> = (0..ring).map(|_| Arc::new(MixerNode::new(2))).collect();
        for (i, mixer) in mixers.iter().enumerate() {
            mixer.input(0).unwrap().connect(Arc::new(ValueNode::new(dc)));
            mixer.input(1).unwrap().connect(mixers[(i + 1) % ring].clone());
            mixer.set_gain(1, gains[i]);
        }

        let mut buf = vec![0.0; len];
        mixers[0].render(&mut buf, &RenderContext::new(0, 1, SAMPLE_RATE));
        prop_assert!(buf.iter().all(|s| s.is_finite()));
        for mixer in &mixers {
            prop_assert_eq!(mixer.render_depth(), 0);
        }

        for mixer in &mixers {
            mixer.input(1).unwrap().disconnect();
        }
    }

    /// Under an internal clock the emitted step is the advance count modulo
    /// the active step count.
    #[test]
    fn internal_advance_wraps(steps in 1usize..=16, advances in 1usize..64) {
        let seq = StepSequencer::with_size(1, steps).unwrap();
        for i in 0..advances {
            prop_assert_eq!(seq.advance(false), i % steps);
        }
        prop_assert_eq!(seq.restarts(), 0);
    }

    /// Under an external clock the step sequence is the same, and every wrap
    /// is a forced restart.
    #[test]
    fn external_advance_restarts_on_wrap(steps in 1usize..=16, advances in 1usize..64) {
        let seq = StepSequencer::with_size(1, steps).unwrap();
        for i in 0..advances {
            prop_assert_eq!(seq.advance(true), i % steps);
        }
        prop_assert_eq!(seq.restarts(), ((advances - 1) / steps) as u64);
    }

    /// Rendering a trigger any number of times at one timestamp yields the
    /// same buffer every time, and the next timestamp is silent.
    #[test]
    fn trigger_render_is_idempotent(
        timestamp in 0u64..1_000_000,
        repeats in 1usize..6,
        len in 2usize..256,
        arms in 1usize..4,
    ) {
        let trigger = TriggerNode::new();
        for _ in 0..arms {
            trigger.set_signal(true);
        }

        let ctx = RenderContext::new(timestamp, 1, SAMPLE_RATE);
        let mut first = vec![0.0; len];
        trigger.render(&mut first, &ctx);
        prop_assert_eq!(&first[..2], &[1.0, 1.0]);
        prop_assert!(first[2..].iter().all(|&s| s == 0.0));

        for _ in 0..repeats {
            let mut again = vec![0.5; len];
            trigger.render(&mut again, &ctx);
            prop_assert_eq!(&again, &first);
        }

        let mut next = vec![0.5; len];
        trigger.render(&mut next, &RenderContext::new(timestamp + len as u64, 1, SAMPLE_RATE));
        prop_assert!(next.iter().all(|&s| s == 0.0));
        prop_assert!(!trigger.is_pending());
    }

    /// Resolved bounds always satisfy `0 <= head < tail <= frames` with at
    /// least the padding between them, whatever the input.
    #[test]
    fn resolved_bounds_are_ordered(
        head in bound_value(),
        tail in bound_value(),
        frames in 0usize..200_000,
    ) {
        if let Some(bounds) = Bounds::resolve(head, tail, frames) {
            prop_assert!(bounds.head() >= 0.0);
            prop_assert!(bounds.head() < bounds.tail());
            prop_assert!(bounds.tail() <= frames as f64);
            prop_assert!(bounds.head() <= bounds.tail() - BOUND_PADDING as f64);
        }
    }

    /// With swing applied, every pair of steps still spans two straight
    /// steps, so tempo is preserved.
    #[test]
    fn swing_preserves_tempo(
        samples_per_step in 10.0f32..500.0f32,
        swing in 0.0f32..0.95f32,
    ) {
        let params = ClockParams {
            samples_per_step,
            samples_per_beat: samples_per_step,
            swing,
            swing_depth: DEFAULT_SWING_DEPTH,
        };
        let mut clock = BeatClock::new();
        let total = (samples_per_step * 12.0) as usize;
        let fired: Vec<usize> = (0..total).filter(|_| clock.advance_internal(&params)).collect();

        for (k, &position) in fired.iter().enumerate().step_by(2) {
            let expected = k as f32 * samples_per_step;
            prop_assert!(
                (position as f32 - expected).abs() <= 2.0,
                "step {} fired at {}, expected about {}", k, position, expected
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Two players with identical settings and input render identical
    /// buffers, and the position never leaves the clip.
    #[test]
    fn playback_is_deterministic(
        settings in player_settings(),
        frames in 1000usize..6000,
        len in 1usize..1024,
        blocks in 1usize..12,
    ) {
        let clip = Arc::new(test_clip(frames));
        let a = configured_player(&clip, settings);
        let b = configured_player(&clip, settings);

        let mut out_a = vec![0.0; len];
        let mut out_b = vec![0.0; len];
        for block in 0..blocks {
            let ctx = RenderContext::new((block * len) as u64, 1, SAMPLE_RATE);
            a.render(&mut out_a, &ctx);
            b.render(&mut out_b, &ctx);
            prop_assert_eq!(&out_a, &out_b);
            prop_assert!(out_a.iter().all(|s| s.is_finite()));
            prop_assert!(a.position() >= 0.0 && a.position() <= frames as f64);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A control thread hammering parameters while the render thread pulls
    /// never produces non-finite output or an out-of-clip position.
    #[test]
    fn concurrent_parameter_writes(
        writes in prop::collection::vec(player_settings(), 8..32),
        frames in 2000usize..8000,
    ) {
        let clip = Arc::new(test_clip(frames));
        let player = ClipPlayer::new(Arc::new(SessionContext::new(SAMPLE_RATE)));
        player.load_shared(clip);
        player.play();
        let done = AtomicBool::new(false);

        let result: Result<(), TestCaseError> = std::thread::scope(|scope| {
            scope.spawn(|| {
                for (i, settings) in writes.iter().cycle().enumerate() {
                    if done.load(Ordering::Relaxed) {
                        break;
                    }
                    player.set_speed(settings.speed);
                    player.set_bounds(settings.head, settings.tail);
                    player.set_looping(settings.looping);
                    player.set_reverse(settings.reverse);
                    match i % 5 {
                        0 => player.play(),
                        1 => player.scrub_to(f64::from(settings.head)),
                        2 => player.set_scrubbing(settings.looping),
                        3 => player.nudge(f64::from(settings.speed) * 100.0),
                        _ => player.set_turntable(settings.reverse && !settings.looping),
                    }
                    std::thread::yield_now();
                }
            });

            let mut buf = vec![0.0; 256];
            for block in 0..200u64 {
                player.render(&mut buf, &RenderContext::new(block * 256, 1, SAMPLE_RATE));
                if !buf.iter().all(|s| s.is_finite()) {
                    done.store(true, Ordering::Relaxed);
                    return Err(TestCaseError::fail("non-finite output"));
                }
                let position = player.position();
                if !(position >= 0.0 && position <= frames as f64) {
                    done.store(true, Ordering::Relaxed);
                    return Err(TestCaseError::fail(format!("position {position} outside clip")));
                }
            }
            done.store(true, Ordering::Relaxed);
            Ok(())
        });
        result?;
    }
}
