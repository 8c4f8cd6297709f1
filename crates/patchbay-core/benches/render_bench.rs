//! Criterion benchmarks for patchbay-core render paths
//!
//! Run with: cargo bench -p patchbay-core
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use patchbay_core::{
    AudioNode, Clip, ClipPlayer, ClockNode, Engine, MixerNode, RenderContext, SessionContext,
    StepDivision, StepSequencer, ValueNode,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn session() -> Arc<SessionContext> {
    Arc::new(SessionContext::new(SAMPLE_RATE))
}

fn test_clip(frames: usize, channels: usize) -> Clip {
    let samples = (0..frames * channels)
        .map(|i| {
            let t = (i / channels) as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 0.5
        })
        .collect();
    Clip::new(samples, channels, SAMPLE_RATE).unwrap()
}

fn bench_clip_player(c: &mut Criterion) {
    let mut group = c.benchmark_group("ClipPlayer");
    let clip = Arc::new(test_clip(SAMPLE_RATE as usize * 4, 2));

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("stereo_loop", block_size),
            &block_size,
            |b, &block_size| {
                let player = ClipPlayer::new(session());
                player.load_shared(Arc::clone(&clip));
                player.set_looping(true);
                player.set_speed(1.37);
                player.play();
                let mut out = vec![0.0; block_size * 2];
                let mut timestamp = 0u64;
                b.iter(|| {
                    player.render(&mut out, &RenderContext::new(timestamp, 2, SAMPLE_RATE));
                    timestamp += block_size as u64;
                    black_box(&out);
                });
            },
        );
    }

    group.finish();
}

fn bench_sequenced_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("clock_sequencer_clip", block_size),
            &block_size,
            |b, &block_size| {
                let session = session();
                let engine = Engine::new(session.clone());

                let seq = Arc::new(StepSequencer::new());
                for step in (0..16).step_by(4) {
                    seq.set_step(0, 0, step, true).unwrap();
                }
                let clock = Arc::new(ClockNode::new(session.clone()));
                clock.set_division(StepDivision::Sixteenth);
                clock.set_swing(0.3);
                clock.set_listener(seq.clone());
                clock.toggle_run(true);
                engine.add_driver(clock);

                let player = Arc::new(ClipPlayer::new(session));
                player.load_clip(test_clip(12_000, 1));
                player.seq_input().connect(seq.row_output(0).unwrap());
                engine.connect_root(player);

                let mut out = vec![0.0; block_size];
                b.iter(|| {
                    engine.render(&mut out, 1);
                    black_box(&out);
                });
            },
        );
    }

    group.finish();
}

fn bench_feedback_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("CycleGuard");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("self_feedback", block_size),
            &block_size,
            |b, &block_size| {
                let mixer = Arc::new(MixerNode::new(2));
                mixer.input(0).unwrap().connect(Arc::new(ValueNode::new(0.25)));
                mixer.input(1).unwrap().connect(mixer.clone());
                mixer.set_gain(1, 0.5);
                let mut out = vec![0.0; block_size];
                b.iter(|| {
                    mixer.render(&mut out, &RenderContext::new(0, 1, SAMPLE_RATE));
                    black_box(&out);
                });
                mixer.input(1).unwrap().disconnect();
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_clip_player,
    bench_sequenced_engine,
    bench_feedback_mixer
);
criterion_main!(benches);
