//! General-purpose nodes for building patch graphs.
//!
//! - [`ValueNode`] / [`ConstantNode`]: constant-level sources
//! - [`SineNode`]: free-running sine oscillator
//! - [`MixerNode`]: fan-in with per-input gain, the usual way to build a
//!   feedback patch
//! - [`VcaNode`]: input scaled by a control signal

mod mixer;
mod sine;
mod value;
mod vca;

pub use mixer::MixerNode;
pub use sine::SineNode;
pub use value::{ConstantNode, ValueNode};
pub use vca::VcaNode;
