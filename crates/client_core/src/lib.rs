pub mod catalog;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod locale;
pub mod media;
pub mod playback;
pub mod preference;
mod session;

pub use catalog::TrackCatalogClient;
pub use config::SessionConfig;
pub use dictionary::{
    DictionarySource, HttpDictionarySource, MissingDictionarySource, StaticDictionarySource,
};
pub use error::{LocaleError, PlaybackError, SessionError};
pub use locale::{interpolate, LocaleController, LocaleEvent, LocaleSnapshot, ModuleTranslator, Variables};
pub use media::{MediaEvent, MediaPlayer, MissingMediaPlayer};
pub use playback::{LoopMode, PlaybackController, PlaybackEvent, PlaybackSnapshot};
pub use preference::{FileLocalePreferenceStore, LocalePreferenceStore, MemoryLocalePreferenceStore};
pub use session::{Session, SessionSlot};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
