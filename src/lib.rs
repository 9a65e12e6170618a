//! # TraceVis-RS: step-through visualization of algorithm traces
//!
//! Given a pre-recorded execution trace (an ordered list of loosely typed
//! snapshots of program state), this crate decides what data structure each
//! variable is, lays it out, highlights what changed since the previous step,
//! tracks pointer variables across steps and drives step-by-step playback.
//!
//! ## Architecture
//!
//! - **Trace**: decoding of the JSON trace document into [`trace::TraceValue`]s
//! - **Resolver**: classification of a variable into a [`resolver::StructureKind`]
//! - **Layout**: tree, graph, trie and sequence layout engines plus a layout cache
//! - **Diff**: index, LCS, node id, cell and key diffs between snapshots
//! - **Pointer**: pointer markers and their motion between steps
//! - **Session**: the playback state machine and its tokio-driven auto-advance
//! - **Frame**: assembly of all of the above into a serializable [`Frame`]
//!
//! ## Configuration
//!
//! Engine options live in [`config::VisualizationConfig`], loaded from the
//! platform-appropriate config directory under `dev.tracevis.tracevis-rs`.
//!
//! ## Example
//!
//! ```no_run
//! use tracevis_rs::{config::VisualizationConfig, FrameBuilder, Trace};
//!
//! fn main() -> tracevis_rs::Result<()> {
//!     let config = VisualizationConfig::load_or_default(None);
//!     let trace = Trace::load_from_file("two_sum.json".as_ref(), config.max_steps)?;
//!
//!     let mut frames = FrameBuilder::new(config);
//!     for frame in frames.build_all(&trace, None) {
//!         println!("{}", serde_json::to_string(&frame).unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod frame;
pub mod layout;
pub mod pointer;
pub mod resolver;
pub mod session;
pub mod trace;

// Re-export commonly used types
pub use config::VisualizationConfig;
pub use error::{Result, TraceVisError};
pub use frame::{Frame, FrameBuilder};
pub use resolver::{ResolvedStructure, StructureKind};
pub use session::{PlaybackDriver, PlaybackSpeed, PlaybackState, StepPlayer};
pub use trace::{Step, StepKind, Trace, TraceValue};
