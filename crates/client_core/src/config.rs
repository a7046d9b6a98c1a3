use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::locale::SupportedLocales;

use crate::playback::LoopMode;

/// Client session settings, usually read from `client.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub server_url: Option<String>,
    pub locales: SupportedLocales,
    /// End-of-track policy. `no_loop` stops after the last track.
    pub loop_mode: LoopMode,
    pub initial_volume: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            locales: SupportedLocales::default(),
            loop_mode: LoopMode::NoLoop,
            initial_volume: 1.0,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("invalid session config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session config '{}'", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed to load session config '{}'", path.display()))
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.locales.contains(&self.locales.default),
            "default locale '{}' is not in the supported set",
            self.locales.default
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
