//! Timer-driven auto-advance on a tokio runtime.
//!
//! [`PlaybackDriver`] owns one [`StepPlayer`] behind a mutex and at most one
//! auto-advance task. Every tick sleeps for the current interval and then
//! calls [`StepPlayer::advance`] under the lock with the generation it was
//! started with. `pause`, `seek` and the manual steps take the same lock, so
//! a tick either lands before them or is rejected as stale.
//!
//! Renderers observe the driver through [`PlaybackEvent`]s on a
//! crossbeam channel. Events are sent while the lock is still held, so the
//! channel order matches the order in which transitions were applied.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::PlaybackSettings;
use crate::error::{Result, TraceVisError};
use crate::trace::Trace;

use super::player::StepPlayer;
use super::types::{PlaybackEvent, PlaybackSpeed, PlaybackState};

/// Drives a [`StepPlayer`] in real time
pub struct PlaybackDriver {
    player: Arc<Mutex<StepPlayer>>,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
    base_interval: Duration,
    event_tx: Sender<PlaybackEvent>,
    event_rx: Receiver<PlaybackEvent>,
}

impl PlaybackDriver {
    /// Create a driver that spawns its ticks on `runtime`
    pub fn new(runtime: Handle, settings: &PlaybackSettings) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            player: Arc::new(Mutex::new(StepPlayer::from_settings(settings))),
            runtime,
            task: None,
            base_interval: settings.base_interval(),
            event_tx,
            event_rx,
        }
    }

    /// Create a driver on the runtime of the calling context
    pub fn from_current(settings: &PlaybackSettings) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| TraceVisError::Runtime(format!("No tokio runtime: {}", e)))?;
        Ok(Self::new(runtime, settings))
    }

    /// Receiver for playback events. Every clone competes for the same
    /// events.
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.event_rx.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StepPlayer> {
        lock_player(&self.player)
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state()
    }

    pub fn current_index(&self) -> usize {
        self.lock().current_index()
    }

    pub fn step_count(&self) -> usize {
        self.lock().step_count()
    }

    /// The loaded trace
    pub fn trace(&self) -> Option<Arc<Trace>> {
        self.lock().trace().cloned()
    }

    pub fn progress(&self) -> f64 {
        self.lock().progress()
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.lock().speed()
    }

    /// Change speed. A running task picks it up on its next tick.
    pub fn set_speed(&self, speed: PlaybackSpeed) {
        self.lock().set_speed(speed);
    }

    pub fn set_loop_playback(&self, loop_enabled: bool) {
        self.lock().set_loop_playback(loop_enabled);
    }

    /// Load a trace, cancelling any running playback
    pub fn load(&mut self, trace: Arc<Trace>) {
        self.cancel_task();
        let mut player = self.lock();
        player.load(trace);
        self.publish(PlaybackEvent::StateChanged(player.state()));
        self.publish(PlaybackEvent::IndexChanged(0));
    }

    /// Start auto-advance. Returns `false` when there is nothing to play.
    pub fn play(&mut self) -> bool {
        self.cancel_task();

        let generation = {
            let mut player = self.lock();
            let Some(generation) = player.play() else {
                return false;
            };
            let index = player.current_index();
            tracing::info!("Playback started at step {}", index);
            self.publish(PlaybackEvent::StateChanged(PlaybackState::Playing));
            self.publish(PlaybackEvent::IndexChanged(index));
            generation
        };

        let player = Arc::clone(&self.player);
        let events = self.event_tx.clone();
        let base = self.base_interval;
        self.task = Some(self.runtime.spawn(async move {
            run_ticks(player, events, base, generation).await;
        }));
        true
    }

    /// Stop auto-advance
    pub fn pause(&mut self) {
        {
            let mut player = self.lock();
            let was_playing = player.is_playing();
            player.pause();
            if was_playing {
                tracing::info!("Playback paused");
                self.publish(PlaybackEvent::StateChanged(PlaybackState::Paused));
            }
        }
        self.cancel_task();
    }

    /// Select a step, pausing first
    pub fn seek(&mut self, index: usize) {
        self.transition(|player| player.seek(index));
    }

    pub fn step_forward(&mut self) {
        self.transition(|player| {
            player.step_forward();
        });
    }

    pub fn step_backward(&mut self) {
        self.transition(|player| {
            player.step_backward();
        });
    }

    /// Apply a manual transition and publish what changed, both under the lock
    fn transition(&mut self, apply: impl FnOnce(&mut StepPlayer)) {
        {
            let mut player = self.lock();
            let (state_before, index_before) = (player.state(), player.current_index());
            apply(&mut *player);

            if player.state() != state_before {
                self.publish(PlaybackEvent::StateChanged(player.state()));
            }
            if player.current_index() != index_before {
                self.publish(PlaybackEvent::IndexChanged(player.current_index()));
            }
        }
        self.cancel_task();
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn publish(&self, event: PlaybackEvent) {
        // The driver holds a receiver itself, so sending cannot fail
        let _ = self.event_tx.send(event);
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

fn lock_player(player: &Mutex<StepPlayer>) -> MutexGuard<'_, StepPlayer> {
    player.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_ticks(
    player: Arc<Mutex<StepPlayer>>,
    events: Sender<PlaybackEvent>,
    base: Duration,
    generation: u64,
) {
    loop {
        let interval = lock_player(&player).speed().interval(base);
        tokio::time::sleep(interval).await;

        let finished = {
            let mut guard = lock_player(&player);
            let Some(index) = guard.advance(generation) else {
                tracing::debug!("Stale playback tick for generation {}", generation);
                return;
            };

            // Sent before the guard drops so a concurrent seek publishes after us
            let _ = events.send(PlaybackEvent::IndexChanged(index));
            let state = guard.state();
            if !state.is_playing() {
                tracing::info!("Playback reached the last step");
                let _ = events.send(PlaybackEvent::StateChanged(state));
            }
            !state.is_playing()
        };
        if finished {
            return;
        }
    }
}
