//! Step player: the playback state machine

use std::sync::Arc;

use crate::config::PlaybackSettings;
use crate::trace::Trace;

use super::types::{PlaybackSpeed, PlaybackState};

/// Playback state over the steps of a loaded trace.
///
/// The player itself never sleeps; auto-advance is driven from outside by
/// calling [`StepPlayer::advance`] with the generation returned from
/// [`StepPlayer::play`]. Every transition out of `Playing` bumps the
/// generation, so a tick scheduled before a pause or seek is rejected.
#[derive(Debug)]
pub struct StepPlayer {
    /// Current playback state
    state: PlaybackState,
    /// The trace being played
    trace: Option<Arc<Trace>>,
    /// Selected step
    current_index: usize,
    /// Auto-advance speed
    speed: PlaybackSpeed,
    /// Whether to restart from the first step after the last one
    loop_playback: bool,
    /// Incremented whenever auto-advance starts or stops
    generation: u64,
}

impl Default for StepPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepPlayer {
    /// Create a new player with no trace loaded
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            trace: None,
            current_index: 0,
            speed: PlaybackSpeed::Normal,
            loop_playback: false,
            generation: 0,
        }
    }

    /// Create a player using the configured playback options
    pub fn from_settings(settings: &PlaybackSettings) -> Self {
        Self {
            loop_playback: settings.loop_playback,
            ..Self::new()
        }
    }

    /// Get current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Get the loaded trace
    pub fn trace(&self) -> Option<&Arc<Trace>> {
        self.trace.as_ref()
    }

    /// Number of steps in the loaded trace
    pub fn step_count(&self) -> usize {
        self.trace.as_ref().map_or(0, |t| t.len())
    }

    /// Get the selected step index
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Change speed. Takes effect from the next tick.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    pub fn loop_playback(&self) -> bool {
        self.loop_playback
    }

    pub fn set_loop_playback(&mut self, loop_enabled: bool) {
        self.loop_playback = loop_enabled;
    }

    /// Current auto-advance generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        match self.step_count() {
            0 | 1 => 0.0,
            n => self.current_index as f64 / (n - 1) as f64,
        }
    }

    fn last_index(&self) -> usize {
        self.step_count().saturating_sub(1)
    }

    /// Load a trace, selecting its first step. A trace without steps leaves
    /// the player idle.
    pub fn load(&mut self, trace: Arc<Trace>) {
        self.generation += 1;
        self.current_index = 0;
        self.state = if trace.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Ready
        };
        tracing::info!("Loaded trace with {} steps", trace.len());
        self.trace = Some(trace);
    }

    /// Unload the current trace
    pub fn unload(&mut self) {
        self.generation += 1;
        self.trace = None;
        self.current_index = 0;
        self.state = PlaybackState::Idle;
    }

    /// Start auto-advance. Returns the generation ticks must present, or
    /// `None` when there is nothing to play (fewer than two steps).
    ///
    /// Playing from the last step restarts at the first.
    pub fn play(&mut self) -> Option<u64> {
        if self.step_count() < 2 {
            return None;
        }
        if self.is_playing() {
            return Some(self.generation);
        }
        if self.current_index >= self.last_index() {
            self.current_index = 0;
        }
        self.generation += 1;
        self.state = PlaybackState::Playing;
        Some(self.generation)
    }

    /// Stop auto-advance, keeping the current step
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.generation += 1;
            self.state = PlaybackState::Paused;
        }
    }

    /// Select a step, clamped to the trace. Pauses first.
    pub fn seek(&mut self, index: usize) {
        if !self.state.is_loaded() {
            return;
        }
        self.pause();
        self.current_index = index.min(self.last_index());
    }

    /// Timer tick. Moves to the next step if `generation` is still the
    /// active one, pausing on the last step unless looping. Returns the new
    /// index, or `None` if the tick is stale or playback already stopped.
    pub fn advance(&mut self, generation: u64) -> Option<usize> {
        if !self.is_playing() || generation != self.generation {
            return None;
        }

        let last = self.last_index();
        if self.current_index >= last {
            if !self.loop_playback {
                self.pause();
                return None;
            }
            self.current_index = 0;
        } else {
            self.current_index += 1;
        }

        if self.current_index == last && !self.loop_playback {
            self.pause();
        }
        Some(self.current_index)
    }

    /// Step forward by one step. Pauses first.
    pub fn step_forward(&mut self) -> bool {
        if !self.state.is_loaded() {
            return false;
        }
        self.pause();
        if self.current_index < self.last_index() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// Step backward by one step. Pauses first.
    pub fn step_backward(&mut self) -> bool {
        if !self.state.is_loaded() {
            return false;
        }
        self.pause();
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Step, StepKind};

    fn create_test_trace(steps: usize) -> Arc<Trace> {
        Arc::new(Trace::new((0..steps).map(|_| Step::new(StepKind::Step)).collect()))
    }

    #[test]
    fn test_player_lifecycle() {
        let mut player = StepPlayer::new();
        assert_eq!(player.state(), PlaybackState::Idle);

        player.load(create_test_trace(5));
        assert_eq!(player.state(), PlaybackState::Ready);
        assert_eq!(player.step_count(), 5);

        assert!(player.play().is_some());
        assert_eq!(player.state(), PlaybackState::Playing);

        player.pause();
        assert_eq!(player.state(), PlaybackState::Paused);

        player.unload();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.trace().is_none());
    }

    #[test]
    fn test_empty_trace_stays_idle() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(0));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.play().is_none());
        player.seek(3);
        assert!(!player.step_forward());
        assert_eq!(player.current_index(), 0);
    }

    #[test]
    fn test_single_step_does_not_play() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(1));
        assert!(player.play().is_none());
        assert_eq!(player.state(), PlaybackState::Ready);
    }

    #[test]
    fn test_advance_pauses_at_last_step() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(3));
        let generation = player.play().unwrap();

        assert_eq!(player.advance(generation), Some(1));
        assert!(player.is_playing());
        assert_eq!(player.advance(generation), Some(2));
        assert_eq!(player.state(), PlaybackState::Paused);
        assert_eq!(player.advance(generation), None);
        assert_eq!(player.current_index(), 2);
    }

    #[test]
    fn test_loop_playback_wraps() {
        let mut player = StepPlayer::new();
        player.set_loop_playback(true);
        player.load(create_test_trace(2));
        let generation = player.play().unwrap();

        assert_eq!(player.advance(generation), Some(1));
        assert_eq!(player.advance(generation), Some(0));
        assert!(player.is_playing());
    }

    #[test]
    fn test_stale_generation_rejected() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(5));
        let first = player.play().unwrap();
        player.pause();
        let second = player.play().unwrap();

        assert_ne!(first, second);
        assert_eq!(player.advance(first), None);
        assert_eq!(player.advance(second), Some(1));
    }

    #[test]
    fn test_seek_pauses_and_clamps() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(4));
        let generation = player.play().unwrap();

        player.seek(10);
        assert_eq!(player.state(), PlaybackState::Paused);
        assert_eq!(player.current_index(), 3);
        assert_eq!(player.advance(generation), None);
    }

    #[test]
    fn test_play_from_end_restarts() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(3));
        player.seek(2);
        player.play();
        assert_eq!(player.current_index(), 0);
    }

    #[test]
    fn test_manual_steps() {
        let mut player = StepPlayer::new();
        player.load(create_test_trace(3));

        assert!(player.step_forward());
        assert!(player.step_forward());
        assert!(!player.step_forward());
        assert_eq!(player.current_index(), 2);

        assert!(player.step_backward());
        assert_eq!(player.current_index(), 1);
        assert!((player.progress() - 0.5).abs() < f64::EPSILON);
    }
}
