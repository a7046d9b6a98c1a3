use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use shared::{
    domain::Track,
    locale::Locale,
    protocol::{Dictionary, DictionarySet},
};
use tracing::{info, warn};

const TRACKS_FILE: &str = "tracks.json";
const LOCALES_DIR: &str = "locales";

/// Track list and translation dictionaries served by the API.
///
/// Loaded once at startup from a data directory:
///
/// ```text
/// <data_dir>/tracks.json
/// <data_dir>/locales/<locale>/<module>.json
/// ```
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
    locales: HashMap<Locale, DictionarySet>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>, locales: HashMap<Locale, DictionarySet>) -> Self {
        Self { tracks, locales }
    }

    pub fn load(data_dir: &Path) -> Result<Self> {
        let tracks = load_tracks(&data_dir.join(TRACKS_FILE))?;
        let locales = load_locales(&data_dir.join(LOCALES_DIR))?;
        info!(
            data_dir = %data_dir.display(),
            tracks = tracks.len(),
            locales = locales.len(),
            "catalog loaded"
        );
        Ok(Self { tracks, locales })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn locale(&self, locale: &Locale) -> Option<&DictionarySet> {
        self.locales.get(locale)
    }

    pub fn module(&self, locale: &Locale, module: &str) -> Option<&Dictionary> {
        self.locales.get(locale).and_then(|modules| modules.get(module))
    }

    pub fn supported_locales(&self) -> Vec<Locale> {
        let mut locales: Vec<Locale> = self.locales.keys().cloned().collect();
        locales.sort();
        locales
    }
}

fn load_tracks(path: &Path) -> Result<Vec<Track>> {
    if !path.exists() {
        warn!(path = %path.display(), "no track list found; serving an empty catalog");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read track list '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid track list '{}'", path.display()))
}

fn load_locales(dir: &Path) -> Result<HashMap<Locale, DictionarySet>> {
    let mut locales = HashMap::new();
    if !dir.is_dir() {
        warn!(path = %dir.display(), "no locale directory found");
        return Ok(locales);
    }

    for entry in read_dir_sorted(dir)? {
        if !entry.is_dir() {
            continue;
        }
        let Some(tag) = entry.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let locale = Locale::new(tag);
        let mut modules = DictionarySet::new();
        for file in read_dir_sorted(&entry)? {
            if file.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(module) = file.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read dictionary '{}'", file.display()))?;
            let dictionary: Dictionary = serde_json::from_str(&raw)
                .with_context(|| format!("invalid dictionary '{}'", file.display()))?;
            modules.insert(module.to_string(), dictionary);
        }
        locales.insert(locale, modules);
    }
    Ok(locales)
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("failed to list '{}'", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to list '{}'", dir.display()))?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
