//! Playback session controller.
//!
//! Owns the playlist, the active index and transport state. All audio work is
//! delegated to a [`MediaPlayer`]; its notifications flow back in through
//! [`PlaybackController::handle_media_event`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use shared::domain::Track;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::PlaybackError,
    media::{MediaEvent, MediaPlayer},
};

/// What happens when a track plays to its end.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Advance, but stop after the last track.
    #[default]
    NoLoop,
    /// Advance and wrap to the first track.
    LoopAll,
    /// Repeat the current track.
    LoopOne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub tracks: Arc<[Track]>,
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub is_muted: bool,
    pub loop_mode: LoopMode,
}

impl PlaybackSnapshot {
    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    /// Volume actually sent to the output.
    pub fn effective_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }
}

#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    StateChanged(PlaybackSnapshot),
    Error(String),
}

struct PlaybackState {
    tracks: Arc<[Track]>,
    current_index: Option<usize>,
    is_playing: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    is_muted: bool,
    loop_mode: LoopMode,
}

impl PlaybackState {
    fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    fn effective_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            tracks: Arc::clone(&self.tracks),
            current_index: self.current_index,
            is_playing: self.is_playing,
            current_time: self.current_time,
            duration: self.duration,
            volume: self.volume,
            is_muted: self.is_muted,
            loop_mode: self.loop_mode,
        }
    }
}

pub struct PlaybackController {
    media: Arc<dyn MediaPlayer>,
    state: Mutex<PlaybackState>,
    events: broadcast::Sender<PlaybackEvent>,
}

fn clamp_volume(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl PlaybackController {
    pub fn new(media: Arc<dyn MediaPlayer>) -> Arc<Self> {
        Self::with_settings(media, 1.0, LoopMode::default())
    }

    pub fn with_settings(
        media: Arc<dyn MediaPlayer>,
        initial_volume: f32,
        loop_mode: LoopMode,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let volume = clamp_volume(initial_volume);
        media.set_volume(volume);
        Arc::new(Self {
            media,
            state: Mutex::new(PlaybackState {
                tracks: Arc::from(Vec::new()),
                current_index: None,
                is_playing: false,
                current_time: 0.0,
                duration: 0.0,
                volume,
                is_muted: false,
                loop_mode,
            }),
            events,
        })
    }

    fn state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &PlaybackState) {
        let _ = self
            .events
            .send(PlaybackEvent::StateChanged(state.snapshot()));
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state().snapshot()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Replaces the playlist without starting playback.
    ///
    /// The active track keeps playing if the new list still contains it;
    /// otherwise playback stops and the index is cleared.
    pub fn set_tracks(&self, tracks: Vec<Track>) {
        let mut state = self.state();
        let follow = state
            .current_track()
            .and_then(|active| tracks.iter().position(|t| t.same_source(active)));
        let had_active = state.current_index.is_some();
        state.tracks = Arc::from(tracks);

        match follow {
            Some(index) => state.current_index = Some(index),
            None => {
                if had_active {
                    info!("playback: active track left the playlist; stopping");
                    self.media.unload();
                }
                state.current_index = None;
                state.is_playing = false;
                state.current_time = 0.0;
                state.duration = 0.0;
            }
        }
        debug!(len = state.tracks.len(), index = ?state.current_index, "playback: playlist replaced");
        self.publish(&state);
    }

    pub fn play_track(&self, index: usize) -> Result<(), PlaybackError> {
        let mut state = self.state();
        self.play_locked(&mut state, index)?;
        self.publish(&state);
        Ok(())
    }

    fn play_locked(&self, state: &mut PlaybackState, index: usize) -> Result<(), PlaybackError> {
        let Some(track) = state.tracks.get(index) else {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: state.tracks.len(),
            });
        };

        info!(index, source = %track.audio_url, "playback: loading track");
        self.media.load(&track.audio_url);
        self.media.set_volume(state.effective_volume());
        self.media.play();

        state.duration = track.duration.map(f64::from).unwrap_or(0.0);
        state.current_index = Some(index);
        state.is_playing = true;
        state.current_time = 0.0;
        Ok(())
    }

    fn stop_locked(&self, state: &mut PlaybackState) {
        self.media.pause();
        self.media.seek(0.0);
        state.is_playing = false;
        state.current_time = 0.0;
    }

    pub fn toggle_play_pause(&self) {
        let mut state = self.state();
        if state.current_index.is_none() {
            return;
        }
        if state.is_playing {
            self.media.pause();
        } else {
            self.media.play();
        }
        state.is_playing = !state.is_playing;
        self.publish(&state);
    }

    /// Advances with wraparound. Does nothing unless a track is active.
    pub fn next_track(&self) {
        self.step(|index, len| (index + 1) % len);
    }

    /// Steps back with wraparound. Does nothing unless a track is active.
    pub fn previous_track(&self) {
        self.step(|index, len| (index + len - 1) % len);
    }

    fn step(&self, next: impl FnOnce(usize, usize) -> usize) {
        let mut state = self.state();
        let len = state.tracks.len();
        let Some(index) = state.current_index else {
            return;
        };
        if len == 0 {
            return;
        }
        if self.play_locked(&mut state, next(index, len)).is_ok() {
            self.publish(&state);
        }
    }

    /// Jumps to `time` seconds, clamped to the known duration.
    pub fn seek(&self, time: f64) {
        let mut state = self.state();
        if state.current_index.is_none() {
            return;
        }
        let target = if time.is_finite() {
            time.clamp(0.0, state.duration.max(0.0))
        } else {
            0.0
        };
        state.current_time = target;
        self.media.seek(target);
        self.publish(&state);
    }

    pub fn set_volume(&self, value: f32) {
        let mut state = self.state();
        let volume = clamp_volume(value);
        state.volume = volume;
        if volume > 0.0 && state.is_muted {
            state.is_muted = false;
        }
        self.media.set_volume(state.effective_volume());
        self.publish(&state);
    }

    /// Mutes or restores output without touching the stored volume.
    pub fn toggle_mute(&self) {
        let mut state = self.state();
        state.is_muted = !state.is_muted;
        self.media.set_volume(state.effective_volume());
        self.publish(&state);
    }

    pub fn set_loop_mode(&self, mode: LoopMode) {
        let mut state = self.state();
        state.loop_mode = mode;
        self.publish(&state);
    }

    /// Applies a media notification. Notifications for any source other than
    /// the active track's are dropped.
    pub fn handle_media_event(&self, event: MediaEvent) {
        let mut state = self.state();
        let is_active = state
            .current_track()
            .is_some_and(|track| track.audio_url == event.source());
        if !is_active {
            debug!(?event, "playback: media event for inactive source ignored");
            return;
        }

        match event {
            MediaEvent::TimeUpdate { time, .. } => {
                if !time.is_finite() {
                    return;
                }
                let mut time = time.max(0.0);
                if state.duration > 0.0 {
                    time = time.min(state.duration);
                }
                state.current_time = time;
            }
            MediaEvent::DurationChange { duration, .. } => {
                if !duration.is_finite() || duration < 0.0 {
                    return;
                }
                state.duration = duration;
                state.current_time = state.current_time.min(duration);
            }
            MediaEvent::Ended { .. } => self.finish_track_locked(&mut state),
            MediaEvent::LoadFailed { source, reason } => {
                warn!(%source, %reason, "playback: media source failed to load");
                state.is_playing = false;
                state.current_time = 0.0;
                let _ = self.events.send(PlaybackEvent::Error(format!(
                    "failed to load {source}: {reason}"
                )));
            }
        }
        self.publish(&state);
    }

    fn finish_track_locked(&self, state: &mut PlaybackState) {
        let (Some(index), len) = (state.current_index, state.tracks.len()) else {
            return;
        };
        let next = match state.loop_mode {
            LoopMode::LoopOne => Some(index),
            LoopMode::LoopAll => Some((index + 1) % len),
            LoopMode::NoLoop if index + 1 < len => Some(index + 1),
            LoopMode::NoLoop => None,
        };
        match next {
            Some(next) => {
                let _ = self.play_locked(state, next);
            }
            None => {
                info!("playback: reached end of playlist");
                self.stop_locked(state);
            }
        }
    }

    /// Forwards media notifications into this controller until either side
    /// goes away.
    pub fn spawn_media_event_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.media.subscribe_events();
        let controller: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "playback: media events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.handle_media_event(event);
            }
        })
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.media.unload();
    }
}

#[cfg(test)]
#[path = "tests/playback_tests.rs"]
mod tests;
