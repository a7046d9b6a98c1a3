use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use client_core::{MediaEvent, MediaPlayer};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::info;

#[derive(Default)]
struct ConsoleState {
    source: Option<String>,
    playing: bool,
    position: f64,
}

struct Inner {
    events: broadcast::Sender<MediaEvent>,
    state: Mutex<ConsoleState>,
    track_length: f64,
}

impl Inner {
    fn tick(&self, step: f64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.playing {
            return;
        }
        let Some(source) = state.source.clone() else {
            return;
        };
        state.position = (state.position + step).min(self.track_length);
        let _ = self.events.send(MediaEvent::TimeUpdate {
            source: source.clone(),
            time: state.position,
        });
        if state.position >= self.track_length {
            state.playing = false;
            let _ = self.events.send(MediaEvent::Ended { source });
        }
    }
}

/// Stand-in output that logs transport calls and advances a clock instead of
/// decoding audio. Every source is treated as `track_length` long.
pub struct ConsoleMediaPlayer {
    inner: Arc<Inner>,
    ticker: JoinHandle<()>,
}

impl ConsoleMediaPlayer {
    pub fn new(track_length: Duration, tick: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        let inner = Arc::new(Inner {
            events,
            state: Mutex::new(ConsoleState::default()),
            track_length: track_length.as_secs_f64(),
        });

        let weak = Arc::downgrade(&inner);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.tick(tick.as_secs_f64());
            }
        });

        Self { inner, ticker }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ConsoleState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaPlayer for ConsoleMediaPlayer {
    fn load(&self, source: &str) {
        info!(source, "output: load");
        let mut state = self.state();
        state.source = Some(source.to_string());
        state.playing = false;
        state.position = 0.0;
        let _ = self.inner.events.send(MediaEvent::DurationChange {
            source: source.to_string(),
            duration: self.inner.track_length,
        });
    }

    fn play(&self) {
        info!("output: play");
        self.state().playing = true;
    }

    fn pause(&self) {
        info!("output: pause");
        self.state().playing = false;
    }

    fn seek(&self, seconds: f64) {
        info!(seconds, "output: seek");
        self.state().position = seconds;
    }

    fn set_volume(&self, volume: f32) {
        info!(volume, "output: volume");
    }

    fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent> {
        self.inner.events.subscribe()
    }

    fn unload(&self) {
        let mut state = self.state();
        state.source = None;
        state.playing = false;
    }
}

impl Drop for ConsoleMediaPlayer {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
