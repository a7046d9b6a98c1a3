use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Key to translated string for a single translation module.
pub type Dictionary = HashMap<String, String>;

/// Module name to dictionary, as loaded for one locale.
pub type DictionarySet = HashMap<String, Dictionary>;

/// Body of `GET /i18n/:locale`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocaleDictionaries {
    pub locale: Option<Locale>,
    #[serde(default)]
    pub modules: DictionarySet,
}

pub fn tracks_route() -> &'static str {
    "/tracks"
}

pub fn locale_dictionaries_route(locale: &Locale) -> String {
    format!("/i18n/{locale}")
}

pub fn module_dictionary_route(locale: &Locale, module: &str) -> String {
    format!("/i18n/{locale}/{module}")
}
