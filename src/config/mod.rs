//! Configuration module for TraceVis-RS
//!
//! This module handles the engine configuration:
//! - Node and step caps applied before layout and diffing
//! - Pointer variable name patterns
//! - Force-directed layout tuning
//! - Layout geometry and playback timing
//!
//! # Config Location
//!
//! The default config file lives in the platform-appropriate config directory
//! under `dev.tracevis.tracevis-rs`:
//!
//! - **Linux**: `~/.config/dev.tracevis.tracevis-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.tracevis.tracevis-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.tracevis.tracevis-rs\config.toml`
//!
//! Files ending in `.json` are read as JSON, everything else as TOML. Keys are
//! camelCase in both formats.
//!
//! # Example
//!
//! ```toml
//! maxVisualizationNodes = 60
//! pointerNamePatterns = ["i", "j", "left", "right", "ptr*"]
//! forceLayoutIterations = 80
//!
//! [layout]
//! nodeSize = 32.0
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, ResultExt, TraceVisError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.tracevis.tracevis-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default cap on nodes fed to layout and diff
pub const DEFAULT_MAX_VISUALIZATION_NODES: usize = 40;

/// Default cap on steps decoded from a trace
pub const DEFAULT_MAX_STEPS: usize = 5000;

/// Default number of Fruchterman-Reingold iterations
pub const DEFAULT_FORCE_LAYOUT_ITERATIONS: usize = 50;

/// Default temperature multiplier applied after each iteration
pub const DEFAULT_COOLDOWN_FACTOR: f64 = 0.9;

/// Default array length above which LCS diffing falls back to index alignment
pub const DEFAULT_ELEMENT_DIFF_CAP: usize = 200;

/// Default number of memoized layouts
pub const DEFAULT_LAYOUT_CACHE_CAPACITY: usize = 32;

/// Variable names treated as pointers unless configured otherwise
pub const DEFAULT_POINTER_PATTERNS: &[&str] = &[
    "i", "j", "k", "l", "r", "left", "right", "lo", "hi", "low", "high", "mid", "start", "end",
    "slow", "fast", "curr", "cur", "prev", "next", "head", "tail", "ptr*", "p", "idx", "index",
    "top", "front", "rear", "node", "root",
];

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizationConfig {
    /// Cap on nodes laid out and diffed per structure
    pub max_visualization_nodes: usize,

    /// Cap on steps kept from a trace
    pub max_steps: usize,

    /// Pointer name patterns; a trailing `*` matches any suffix
    pub pointer_name_patterns: Vec<String>,

    /// Force-directed iterations for graphs above the circular threshold
    pub force_layout_iterations: usize,

    /// Temperature multiplier per force-directed iteration
    pub cooldown_factor: f64,

    /// Arrays longer than this are diffed by position instead of LCS
    pub element_diff_cap: usize,

    /// Maximum number of memoized layouts
    pub layout_cache_capacity: usize,

    pub layout: LayoutSettings,

    pub playback: PlaybackSettings,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            max_visualization_nodes: DEFAULT_MAX_VISUALIZATION_NODES,
            max_steps: DEFAULT_MAX_STEPS,
            pointer_name_patterns: DEFAULT_POINTER_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            force_layout_iterations: DEFAULT_FORCE_LAYOUT_ITERATIONS,
            cooldown_factor: DEFAULT_COOLDOWN_FACTOR,
            element_diff_cap: DEFAULT_ELEMENT_DIFF_CAP,
            layout_cache_capacity: DEFAULT_LAYOUT_CACHE_CAPACITY,
            layout: LayoutSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl VisualizationConfig {
    /// Load and validate a config file (TOML, or JSON by extension)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };

        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_path() {
                Some(p) if p.exists() => p,
                _ => return Self::default(),
            },
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TraceVisError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engines cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_visualization_nodes == 0 {
            return Err(TraceVisError::Config(
                "maxVisualizationNodes must be at least 1".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(TraceVisError::Config("maxSteps must be at least 1".to_string()));
        }
        if !(self.cooldown_factor > 0.0 && self.cooldown_factor <= 1.0) {
            return Err(TraceVisError::Config(format!(
                "cooldownFactor must be in (0, 1], got {}",
                self.cooldown_factor
            )));
        }
        if !(self.layout.node_size > 0.0) || !(self.layout.level_spacing > 0.0) {
            return Err(TraceVisError::Config(
                "layout nodeSize and levelSpacing must be positive".to_string(),
            ));
        }
        if self.layout.sibling_gap < 0.0 {
            return Err(TraceVisError::Config(
                "layout siblingGap must not be negative".to_string(),
            ));
        }
        if !(self.layout.canvas_width > self.layout.node_size)
            || !(self.layout.canvas_height > self.layout.node_size)
        {
            return Err(TraceVisError::Config(
                "layout canvas must be larger than a node".to_string(),
            ));
        }
        if self.playback.base_interval_ms == 0 {
            return Err(TraceVisError::Config(
                "playback baseIntervalMs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
