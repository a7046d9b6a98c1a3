use tokio::sync::broadcast;
use tracing::warn;

/// Asynchronous notifications emitted by a [`MediaPlayer`].
///
/// Every variant names the source it was produced for, so notifications that
/// arrive after the controller moved on can be told apart from current ones.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position, in seconds.
    TimeUpdate { source: String, time: f64 },
    /// Length of the source, in seconds.
    DurationChange { source: String, duration: f64 },
    /// The source played to its end.
    Ended { source: String },
    LoadFailed { source: String, reason: String },
}

impl MediaEvent {
    pub fn source(&self) -> &str {
        match self {
            Self::TimeUpdate { source, .. }
            | Self::DurationChange { source, .. }
            | Self::Ended { source }
            | Self::LoadFailed { source, .. } => source,
        }
    }
}

/// Audio decode/output facility driven by the playback controller.
///
/// Every call is fire-and-forget: outcomes arrive later through
/// [`MediaPlayer::subscribe_events`]. Implementations must not call back into
/// the controller synchronously.
pub trait MediaPlayer: Send + Sync {
    fn load(&self, source: &str);
    fn play(&self);
    fn pause(&self);
    fn seek(&self, seconds: f64);
    /// Output volume in `[0, 1]`.
    fn set_volume(&self, volume: f32);
    fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent>;

    /// Releases the loaded source. Called when the owning controller is dropped.
    fn unload(&self) {
        self.pause();
    }
}

/// Placeholder used when no audio output is wired in; every load fails.
pub struct MissingMediaPlayer {
    events: broadcast::Sender<MediaEvent>,
}

impl MissingMediaPlayer {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { events }
    }
}

impl Default for MissingMediaPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaPlayer for MissingMediaPlayer {
    fn load(&self, source: &str) {
        warn!(source, "media: no audio output available");
        let _ = self.events.send(MediaEvent::LoadFailed {
            source: source.to_string(),
            reason: "audio output is unavailable".to_string(),
        });
    }

    fn play(&self) {}

    fn pause(&self) {}

    fn seek(&self, _seconds: f64) {}

    fn set_volume(&self, _volume: f32) {}

    fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}
