use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A language/region identifier such as `en` or `my`.
///
/// Only [`SupportedLocales::parse`] hands out values that belong to the active
/// set; the raw constructor exists for payloads and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported locale '{0}'")]
pub struct UnsupportedLocale(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLocales {
    pub locales: Vec<Locale>,
    pub default: Locale,
}

impl Default for SupportedLocales {
    fn default() -> Self {
        Self {
            locales: vec![Locale::new("en"), Locale::new("my")],
            default: Locale::new("en"),
        }
    }
}

impl SupportedLocales {
    pub fn parse(&self, raw: &str) -> Result<Locale, UnsupportedLocale> {
        let candidate = Locale::new(raw);
        if self.locales.contains(&candidate) {
            Ok(candidate)
        } else {
            Err(UnsupportedLocale(raw.to_string()))
        }
    }

    pub fn contains(&self, locale: &Locale) -> bool {
        self.locales.contains(locale)
    }

    /// Resolves a persisted preference, falling back to the default when it is
    /// missing or no longer supported.
    pub fn resolve(&self, preferred: Option<&str>) -> Locale {
        preferred
            .and_then(|raw| self.parse(raw).ok())
            .unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let supported = SupportedLocales::default();
        assert_eq!(supported.parse(" EN ").expect("en"), Locale::new("en"));
    }

    #[test]
    fn parse_rejects_unknown_tags() {
        let supported = SupportedLocales::default();
        assert_eq!(
            supported.parse("fr"),
            Err(UnsupportedLocale("fr".to_string()))
        );
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let supported = SupportedLocales::default();
        assert_eq!(supported.resolve(Some("my")), Locale::new("my"));
        assert_eq!(supported.resolve(Some("de")), Locale::new("en"));
        assert_eq!(supported.resolve(None), Locale::new("en"));
    }
}
