//! The render scene: one clock driving a step sequencer whose first row
//! retriggers a clip player.

use std::sync::Arc;

use patchbay_config::{ConfigError, SessionPreset};
use patchbay_core::{
    ClipPlayer, ClockNode, Clip, ControlError, Engine, SessionContext, StepSequencer,
};

/// What the render writes to the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monitor {
    /// Clip player audio.
    Clip,
    /// Raw output of one sequencer row.
    Row(usize),
}

/// Devices and the engine that renders them.
pub struct Scene {
    pub session: Arc<SessionContext>,
    pub engine: Engine,
    pub clock: Arc<ClockNode>,
    pub sequencer: Arc<StepSequencer>,
    pub player: Arc<ClipPlayer>,
}

impl Scene {
    /// Builds the devices at `sample_rate` and patches row 0 into the clip
    /// player's sequence input.
    pub fn new(sample_rate: u32) -> Result<Self, ControlError> {
        let session = Arc::new(SessionContext::new(sample_rate as f32));
        let engine = Engine::new(session.clone());
        let clock = Arc::new(ClockNode::new(session.clone()));
        let sequencer = Arc::new(StepSequencer::new());
        let player = Arc::new(ClipPlayer::new(session.clone()));

        clock.set_listener(sequencer.clone());
        engine.add_driver(clock.clone());
        player.seq_input().connect(sequencer.row_output(0)?);
        engine.connect_root(player.clone());

        Ok(Self {
            session,
            engine,
            clock,
            sequencer,
            player,
        })
    }

    /// Applies a session preset to every device.
    pub fn apply(&self, preset: &SessionPreset) -> Result<(), ConfigError> {
        preset.apply(
            &self.session,
            &self.clock,
            &self.sequencer,
            Some(&self.player),
        )
    }

    /// Routes the engine root to the chosen signal.
    pub fn monitor(&self, monitor: Monitor) -> Result<(), ControlError> {
        match monitor {
            Monitor::Clip => self.engine.connect_root(self.player.clone()),
            Monitor::Row(row) => {
                let output = self.sequencer.row_output(row)?;
                self.engine.connect_root(output);
                // The player is no longer pulled by the root, so keep it
                // running as a driver for its play state to advance.
                self.engine.add_driver(self.player.clone());
            }
        }
        Ok(())
    }

    /// Renders `frames` interleaved frames in callbacks of `buffer_size` frames.
    pub fn render(&self, frames: usize, channels: usize, buffer_size: usize) -> Vec<f32> {
        let channels = channels.max(1);
        let block = buffer_size.max(1) * channels;
        let mut out = vec![0.0; frames * channels];
        for chunk in out.chunks_mut(block) {
            self.engine.render(chunk, channels);
        }
        out
    }
}

/// Synthesizes a short decaying pluck used when no clip file is given.
pub fn pluck(sample_rate: u32) -> Result<Clip, ControlError> {
    let sr = sample_rate.max(1) as f32;
    let frames = (sr * 0.4) as usize;
    let samples = (0..frames)
        .map(|i| {
            let t = i as f32 / sr;
            let phase = core::f32::consts::TAU * 220.0 * t;
            let body = phase.sin() + 0.3 * (2.0 * phase).sin() + 0.1 * (3.0 * phase).sin();
            0.6 * body * (-9.0 * t).exp()
        })
        .collect();
    Clip::new(samples, 1, sr)
}
