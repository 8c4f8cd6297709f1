//! Patchbay Core - real-time audio signal graph
//!
//! A pull-based graph of audio nodes rendered from a periodic audio callback,
//! with the sequencing and playback devices that sit on top of it. Parameters
//! are written from a control thread without locks while the render thread
//! keeps its deadline.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`AudioNode`] - The render contract; every signal source and processor
//! - [`Jack`] - A patch point holding one atomically swappable upstream source
//! - [`CycleGuard`] - Per-node depth limiter that turns feedback patches into silence
//! - [`ScratchBank`] - Per-depth scratch lanes for pulling upstream buffers
//! - [`Engine`] - Host render loop: drivers, root jack, timestamps
//!
//! ## Event Primitives
//!
//! - [`TriggerNode`] - One-shot two-frame pulse armed from the control thread
//! - [`GateNode`] - Level-held gate with retrigger notch
//! - [`ValueNode`] - Settable constant level
//! - [`Memoized`] - Per-timestamp render cache for fan-out
//!
//! ## Devices
//!
//! - [`ClockNode`] / [`BeatClock`] - Tempo and swing aware step clock
//! - [`StepSequencer`] - Multi-pattern step sequencer with trigger and continuous rows
//! - [`ClipPlayer`] - Variable-speed clip playback with bounds, looping, scrub and turntable modes
//!
//! ## Utilities
//!
//! - [`kernels`] - Fill, interpolation, resampling and edge detection
//! - [`SineNode`], [`MixerNode`], [`VcaNode`], [`ConstantNode`]
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use patchbay_core::{ClockNode, Engine, SessionContext, StepSequencer};
//!
//! let session = Arc::new(SessionContext::new(48000.0));
//! let engine = Engine::new(session.clone());
//!
//! let seq = Arc::new(StepSequencer::with_size(1, 4).unwrap());
//! seq.set_step(0, 0, 0, true).unwrap();
//!
//! let clock = Arc::new(ClockNode::new(session));
//! clock.set_listener(seq.clone());
//! clock.toggle_run(true);
//!
//! engine.add_driver(clock);
//! engine.connect_root(seq.row_output(0).unwrap());
//!
//! let mut buffer = vec![0.0; 256];
//! engine.render(&mut buffer, 1);
//! assert_eq!(&buffer[..3], &[1.0, 1.0, 0.0]);
//! ```
//!
//! # Design Principles
//!
//! - **Render never blocks**: state cells use `try_lock`, parameters are atomics
//! - **No allocation on the render path**: scratch is allocated at construction
//! - **Fail soft**: cycles, missing clips and bad numbers render silence

pub mod clip;
pub mod clock;
pub mod context;
pub mod engine;
pub mod error;
pub mod guard;
pub mod kernels;
pub mod node;
pub mod nodes;
pub mod one_pole;
pub mod patch;
pub mod scratch;
pub mod sequencer;
pub mod shared;
pub mod trigger;

/// Largest interleaved buffer a single pull may carry. Scratch lanes and
/// render caches are sized to this; the [`Engine`] splits longer host
/// buffers into blocks.
pub const MAX_BLOCK_SAMPLES: usize = 8192;

pub use clip::{
    BOUND_PADDING, Bounds, Clip, ClipPlayer, EXP_PITCH_OCTAVES, LIN_PITCH_RANGE, PlaybackObserver,
};
pub use clock::{
    BeatClock, ClockListener, ClockNode, ClockParams, ClockTick, DEFAULT_SWING_DEPTH, MAX_SWING,
    MEASURE_BEATS, StepDivision, swung_interval,
};
pub use context::SessionContext;
pub use engine::Engine;
pub use error::ControlError;
pub use guard::{CycleGuard, GuardToken, MAX_RENDER_DEPTH};
pub use kernels::{BinaryState, EdgeDetector};
pub use node::{AudioNode, RenderContext, RenderStatus, SharedNode, shared};
pub use nodes::{ConstantNode, MixerNode, SineNode, ValueNode, VcaNode};
pub use one_pole::OnePole;
pub use patch::Jack;
pub use scratch::{ScratchBank, ScratchLease};
pub use sequencer::{
    MAX_PATTERNS, MAX_ROWS, MAX_STEPS, PatternMemory, RowMode, StepSequencer, StepState,
    StepValue, StepWidget,
};
pub use shared::{AtomicF32, AtomicF64};
pub use trigger::{CachedTrigger, GateNode, Memoized, PULSE_FRAMES, TriggerNode};
