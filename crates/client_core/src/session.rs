use std::sync::{Arc, PoisonError, RwLock};

use shared::protocol::DictionarySet;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    config::SessionConfig,
    dictionary::{DictionarySource, MissingDictionarySource},
    error::SessionError,
    locale::LocaleController,
    media::{MediaPlayer, MissingMediaPlayer},
    playback::PlaybackController,
    preference::{LocalePreferenceStore, MemoryLocalePreferenceStore},
};

/// One user session: a playback controller and a locale controller sharing a
/// lifetime. Dropping the session stops the media event pump and releases the
/// media player.
pub struct Session {
    playback: Arc<PlaybackController>,
    locale: Arc<LocaleController>,
    media_pump: JoinHandle<()>,
}

impl Session {
    /// Starts a session with no audio output and no dictionary source.
    pub async fn start(config: &SessionConfig) -> Self {
        Self::start_with_dependencies(
            config,
            Arc::new(MissingMediaPlayer::new()),
            Arc::new(MissingDictionarySource),
            Arc::new(MemoryLocalePreferenceStore::default()),
            None,
        )
        .await
    }

    /// Must run inside a tokio runtime; the media event pump is spawned on it.
    pub async fn start_with_dependencies(
        config: &SessionConfig,
        media: Arc<dyn MediaPlayer>,
        dictionaries: Arc<dyn DictionarySource>,
        preferences: Arc<dyn LocalePreferenceStore>,
        initial_dictionaries: Option<DictionarySet>,
    ) -> Self {
        let playback =
            PlaybackController::with_settings(media, config.initial_volume, config.loop_mode);
        let media_pump = playback.spawn_media_event_pump();

        let locale = LocaleController::new(config.locales.clone(), dictionaries, preferences);
        match locale.bootstrap(initial_dictionaries).await {
            Ok(active) => info!(locale = %active, "session: started"),
            Err(err) => warn!(error = %err, "session: started without locale dictionaries"),
        }

        Self {
            playback,
            locale,
            media_pump,
        }
    }

    pub fn playback(&self) -> &Arc<PlaybackController> {
        &self.playback
    }

    pub fn locale(&self) -> &Arc<LocaleController> {
        &self.locale
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.media_pump.abort();
    }
}

/// The scope presentation code reaches the active session through.
///
/// Accessors fail with [`SessionError::NotInitialized`] until a session is
/// installed.
#[derive(Default)]
pub struct SessionSlot {
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `session`, returning the one it replaces.
    pub fn install(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(session)
    }

    pub fn clear(&self) -> Option<Arc<Session>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn session(&self) -> Result<Arc<Session>, SessionError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SessionError::NotInitialized)
    }

    pub fn playback(&self) -> Result<Arc<PlaybackController>, SessionError> {
        self.session().map(|session| Arc::clone(&session.playback))
    }

    pub fn locale(&self) -> Result<Arc<LocaleController>, SessionError> {
        self.session().map(|session| Arc::clone(&session.locale))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
