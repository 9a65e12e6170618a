//! Playback data types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// State of trace playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// No trace loaded, or the trace has no steps
    #[default]
    Idle,
    /// Trace loaded, not yet played
    Ready,
    /// Auto-advancing
    Playing,
    /// Auto-advance stopped at the current step
    Paused,
}

impl PlaybackState {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::Paused)
    }

    /// Check if a trace is loaded
    pub fn is_loaded(&self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Ready => "Ready",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// Auto-advance speed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    #[serde(rename = "0.5")]
    Half,
    #[default]
    #[serde(rename = "1")]
    Normal,
    #[serde(rename = "2")]
    Double,
    #[serde(rename = "4")]
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }

    /// Parse a multiplier such as `2`, `0.5x` or `4x`
    pub fn from_multiplier(text: &str) -> Option<Self> {
        let value: f64 = text
            .trim()
            .trim_end_matches(|c: char| c.eq_ignore_ascii_case(&'x'))
            .parse()
            .ok()?;
        Self::ALL.into_iter().find(|s| s.multiplier() == value)
    }

    /// Time between steps at this speed
    pub fn interval(&self, base: Duration) -> Duration {
        match self {
            PlaybackSpeed::Half => base * 2,
            PlaybackSpeed::Normal => base,
            PlaybackSpeed::Double => base / 2,
            PlaybackSpeed::Quadruple => base / 4,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackSpeed::Half => "0.5x",
            PlaybackSpeed::Normal => "1x",
            PlaybackSpeed::Double => "2x",
            PlaybackSpeed::Quadruple => "4x",
        }
    }
}

impl std::str::FromStr for PlaybackSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_multiplier(s)
            .ok_or_else(|| format!("unsupported speed '{}', use 0.5, 1, 2 or 4", s))
    }
}

impl std::fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Notifications published by the playback driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The selected step changed
    IndexChanged(usize),
    /// The playback state changed
    StateChanged(PlaybackState),
}
