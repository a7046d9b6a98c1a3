use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::Track,
    locale::Locale,
    protocol::{Dictionary, DictionarySet},
};
use tokio::sync::{broadcast, Notify};

use crate::{dictionary::DictionarySource, media::{MediaEvent, MediaPlayer}};

#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    Unload,
}

pub struct RecordingMediaPlayer {
    calls: Mutex<Vec<MediaCall>>,
    events: broadcast::Sender<MediaEvent>,
}

impl RecordingMediaPlayer {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            events,
        })
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("calls").clear();
    }

    pub fn last_volume(&self) -> Option<f32> {
        self.calls().into_iter().rev().find_map(|call| match call {
            MediaCall::SetVolume(v) => Some(v),
            _ => None,
        })
    }

    pub fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    fn record(&self, call: MediaCall) {
        self.calls.lock().expect("calls").push(call);
    }
}

impl MediaPlayer for RecordingMediaPlayer {
    fn load(&self, source: &str) {
        self.record(MediaCall::Load(source.to_string()));
    }

    fn play(&self) {
        self.record(MediaCall::Play);
    }

    fn pause(&self) {
        self.record(MediaCall::Pause);
    }

    fn seek(&self, seconds: f64) {
        self.record(MediaCall::Seek(seconds));
    }

    fn set_volume(&self, volume: f32) {
        self.record(MediaCall::SetVolume(volume));
    }

    fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }

    fn unload(&self) {
        self.record(MediaCall::Unload);
    }
}

/// Audio source of the track named `name` in [`tracks`].
pub fn source(name: &str) -> String {
    format!("/audio/{name}.mp3")
}

pub fn tracks(names: &[&str]) -> Vec<Track> {
    names
        .iter()
        .map(|name| Track::new(*name, "Artist", source(name)).with_duration(200))
        .collect()
}

pub fn dictionary(entries: &[(&str, &str)]) -> Dictionary {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// In-memory source that counts fetches and can hold module fetches until
/// released.
#[derive(Default)]
pub struct CountingDictionarySource {
    locales: HashMap<Locale, DictionarySet>,
    module_fetches: AtomicUsize,
    all_fetches: AtomicUsize,
    failures_left: AtomicUsize,
    module_gate: Option<Arc<Notify>>,
    all_gate: Option<Arc<Notify>>,
}

impl CountingDictionarySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, locale: &str, module: &str, entries: &[(&str, &str)]) -> Self {
        self.locales
            .entry(Locale::new(locale))
            .or_default()
            .insert(module.to_string(), dictionary(entries));
        self
    }

    pub fn failing_first(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn gate_modules(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.module_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn gate_locales(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.all_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn module_fetches(&self) -> usize {
        self.module_fetches.load(Ordering::SeqCst)
    }

    pub fn all_fetches(&self) -> usize {
        self.all_fetches.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DictionarySource for CountingDictionarySource {
    async fn fetch_dictionary(&self, locale: &Locale, module: &str) -> Result<Dictionary> {
        self.module_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.module_gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;
        if self.take_failure() {
            return Err(anyhow!("simulated outage"));
        }
        self.locales
            .get(locale)
            .and_then(|modules| modules.get(module))
            .cloned()
            .ok_or_else(|| anyhow!("missing module {module}"))
    }

    async fn fetch_all_dictionaries(&self, locale: &Locale) -> Result<DictionarySet> {
        self.all_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.all_gate {
            gate.notified().await;
        }
        if self.take_failure() {
            return Err(anyhow!("simulated outage"));
        }
        Ok(self.locales.get(locale).cloned().unwrap_or_default())
    }
}
