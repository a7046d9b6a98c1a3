use shared::locale::{Locale, UnsupportedLocale};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("track index {index} out of range for a playlist of {len} tracks")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error(transparent)]
    UnsupportedLocale(#[from] UnsupportedLocale),
    /// `module` is `None` when the locale-wide dictionary set failed.
    #[error("failed to fetch {} for locale {locale}: {reason}", .module.as_deref().unwrap_or("dictionaries"))]
    FetchFailure {
        locale: Locale,
        module: Option<String>,
        reason: String,
    },
    #[error("locale {requested} was replaced before {} finished loading", .module.as_deref().unwrap_or("its dictionaries"))]
    Stale {
        requested: Locale,
        module: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session controller accessed before a session was installed")]
    NotInitialized,
}
