use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::locale::Locale;

/// Persisted locale choice, the native equivalent of a locale cookie.
#[async_trait]
pub trait LocalePreferenceStore: Send + Sync {
    async fn persisted_locale(&self) -> Result<Option<String>>;
    async fn persist_locale(&self, locale: &Locale) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    locale: Option<String>,
}

/// Stores the preference as `locale = "..."` in a TOML file.
pub struct FileLocalePreferenceStore {
    path: PathBuf,
}

impl FileLocalePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LocalePreferenceStore for FileLocalePreferenceStore {
    async fn persisted_locale(&self) -> Result<Option<String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read preferences '{}'", self.path.display())
                })
            }
        };
        let file: PreferenceFile = toml::from_str(&raw)
            .with_context(|| format!("invalid preferences file '{}'", self.path.display()))?;
        Ok(file.locale)
    }

    async fn persist_locale(&self, locale: &Locale) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create preferences directory '{}'", parent.display())
            })?;
        }
        let raw = toml::to_string(&PreferenceFile {
            locale: Some(locale.to_string()),
        })?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("failed to write preferences '{}'", self.path.display()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryLocalePreferenceStore {
    locale: Mutex<Option<String>>,
}

impl MemoryLocalePreferenceStore {
    pub fn new(initial: Option<&str>) -> Self {
        Self {
            locale: Mutex::new(initial.map(str::to_string)),
        }
    }
}

#[async_trait]
impl LocalePreferenceStore for MemoryLocalePreferenceStore {
    async fn persisted_locale(&self) -> Result<Option<String>> {
        Ok(self
            .locale
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn persist_locale(&self, locale: &Locale) -> Result<()> {
        *self.locale.lock().unwrap_or_else(PoisonError::into_inner) = Some(locale.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/preference_tests.rs"]
mod tests;
