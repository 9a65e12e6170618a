//! Step-by-step playback of a loaded trace
//!
//! This module provides the playback controller:
//!
//! - [`StepPlayer`]: the synchronous state machine
//!   (`Idle → Ready → Playing ⇄ Paused`) with seek, manual stepping, speed
//!   and loop options
//! - [`PlaybackDriver`]: runs the player's auto-advance as a cancellable
//!   tokio task and publishes [`PlaybackEvent`]s

pub mod driver;
pub mod player;
pub mod types;

pub use driver::PlaybackDriver;
pub use player::StepPlayer;
pub use types::{PlaybackEvent, PlaybackSpeed, PlaybackState};
