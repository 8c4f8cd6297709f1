//! Session presets for patchbay devices.
//!
//! Snapshots of the clock, step sequencer and clip player that can be
//! captured from live devices, stored as TOML, validated and applied back.
//! The sample data a clip player holds is not stored; a clip preset names the
//! file the host should load.
//!
//! # Features
//!
//! - **Session Presets**: Load and save whole sessions from TOML files
//! - **Device Snapshots**: Capture and apply clock, sequencer and clip settings
//! - **Validation**: Every field is checked before anything is applied
//! - **Factory Presets**: Built-in sessions for demos and starting points
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use patchbay_config::SessionPreset;
//! use patchbay_core::{ClockNode, SessionContext, StepSequencer};
//!
//! let session = Arc::new(SessionContext::new(48000.0));
//! let clock = ClockNode::new(session.clone());
//! let sequencer = StepSequencer::new();
//!
//! let preset = SessionPreset::load("groove.toml").unwrap();
//! preset.apply(&session, &clock, &sequencer, None).unwrap();
//!
//! let snapshot = SessionPreset::capture("groove v2", &session, &clock, &sequencer, None);
//! snapshot.save("groove_v2.toml").unwrap();
//! ```

mod clip;
mod clock;
mod error;
mod sequencer;
mod session;

/// Preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory;

pub use clip::ClipPreset;
pub use clock::ClockPreset;
pub use error::ConfigError;
pub use factory::{factory_preset_names, factory_presets, get_factory_preset};
pub use sequencer::{PatternPreset, RowModeSetting, RowPreset, SequencerPreset};
pub use session::SessionPreset;
pub use validation::{
    ValidationError, ValidationResult, validate_clip, validate_clock, validate_sequencer,
    validate_session,
};
