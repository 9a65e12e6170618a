//! Geometry and playback settings
//!
//! These are the nested blocks of [`super::VisualizationConfig`]. Every field
//! has a default so partial config files only need to name what they change.
//!
//! # Main Types
//!
//! - [`LayoutSettings`] - Node size and spacing shared by all layout engines
//! - [`PlaybackSettings`] - Base interval and looping for auto-advance

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default node diameter in layout units
pub const DEFAULT_NODE_SIZE: f64 = 40.0;

/// Default vertical distance between tree levels
pub const DEFAULT_LEVEL_SPACING: f64 = 70.0;

/// Default horizontal gap between sibling subtrees
pub const DEFAULT_SIBLING_GAP: f64 = 12.0;

/// Default canvas for force-directed graphs
pub const DEFAULT_CANVAS_WIDTH: f64 = 640.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 420.0;

/// Default time between auto-advanced steps at 1x speed
pub const DEFAULT_BASE_INTERVAL_MS: u64 = 800;

/// Geometry shared by the layout engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    /// Node diameter
    pub node_size: f64,

    /// Vertical distance between tree/trie levels
    pub level_spacing: f64,

    /// Horizontal gap between sibling subtrees and sequence cells
    pub sibling_gap: f64,

    /// Force-directed canvas width
    pub canvas_width: f64,

    /// Force-directed canvas height
    pub canvas_height: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_size: DEFAULT_NODE_SIZE,
            level_spacing: DEFAULT_LEVEL_SPACING,
            sibling_gap: DEFAULT_SIBLING_GAP,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl LayoutSettings {
    /// Horizontal distance between neighbouring slot centers
    pub fn slot_width(&self) -> f64 {
        self.node_size + self.sibling_gap
    }
}

/// Auto-advance timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Interval between steps at 1x speed, in milliseconds
    pub base_interval_ms: u64,

    /// Restart from the first step instead of pausing at the last
    pub loop_playback: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            base_interval_ms: DEFAULT_BASE_INTERVAL_MS,
            loop_playback: false,
        }
    }
}

impl PlaybackSettings {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }
}
