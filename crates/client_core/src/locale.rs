//! Locale session controller: active locale, lazily loaded translation
//! modules and string lookup.
//!
//! Modules are loaded at most once per locale. Concurrent requests for a
//! module that is already being fetched await the same fetch. Every locale
//! switch bumps a generation counter; fetches issued under an older
//! generation are dropped when they complete.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use shared::{
    locale::{Locale, SupportedLocales},
    protocol::{Dictionary, DictionarySet},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{dictionary::DictionarySource, error::LocaleError, preference::LocalePreferenceStore};

/// Placeholder values for [`interpolate`].
pub type Variables = HashMap<String, String>;

type PendingModule = Shared<BoxFuture<'static, Result<Arc<Dictionary>, LocaleError>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSnapshot {
    pub locale: Locale,
    pub loaded_modules: Vec<String>,
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
pub enum LocaleEvent {
    StateChanged(LocaleSnapshot),
    ModuleLoaded { locale: Locale, module: String },
    Error(String),
}

struct LocaleState {
    locale: Locale,
    generation: u64,
    translations: HashMap<String, Arc<Dictionary>>,
    in_flight: HashMap<String, PendingModule>,
    is_loading: bool,
}

impl LocaleState {
    fn snapshot(&self) -> LocaleSnapshot {
        let mut loaded_modules: Vec<String> = self.translations.keys().cloned().collect();
        loaded_modules.sort();
        LocaleSnapshot {
            locale: self.locale.clone(),
            loaded_modules,
            is_loading: self.is_loading,
        }
    }

    /// Enters a new locale, dropping everything loaded for the old one.
    fn switch_to(&mut self, locale: Locale) -> u64 {
        self.generation += 1;
        self.locale = locale;
        self.translations.clear();
        self.in_flight.clear();
        self.generation
    }

    fn install_all(&mut self, dictionaries: DictionarySet) {
        for (module, dictionary) in dictionaries {
            self.translations
                .entry(module)
                .or_insert_with(|| Arc::new(dictionary));
        }
    }
}

pub struct LocaleController {
    supported: SupportedLocales,
    source: Arc<dyn DictionarySource>,
    preferences: Arc<dyn LocalePreferenceStore>,
    state: Mutex<LocaleState>,
    events: broadcast::Sender<LocaleEvent>,
}

impl LocaleController {
    /// Creates a controller on the default locale with nothing loaded.
    /// Call [`LocaleController::bootstrap`] to apply the persisted preference.
    pub fn new(
        supported: SupportedLocales,
        source: Arc<dyn DictionarySource>,
        preferences: Arc<dyn LocalePreferenceStore>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let locale = supported.default.clone();
        Arc::new(Self {
            supported,
            source,
            preferences,
            state: Mutex::new(LocaleState {
                locale,
                generation: 0,
                translations: HashMap::new(),
                in_flight: HashMap::new(),
                is_loading: false,
            }),
            events,
        })
    }

    fn state(&self) -> MutexGuard<'_, LocaleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &LocaleState) {
        let _ = self
            .events
            .send(LocaleEvent::StateChanged(state.snapshot()));
    }

    pub fn snapshot(&self) -> LocaleSnapshot {
        self.state().snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocaleEvent> {
        self.events.subscribe()
    }

    pub fn supported_locales(&self) -> &SupportedLocales {
        &self.supported
    }

    pub fn locale(&self) -> Locale {
        self.state().locale.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn is_module_loaded(&self, module: &str) -> bool {
        self.state().translations.contains_key(module)
    }

    /// Seeds the session from the persisted preference.
    ///
    /// `initial` is a dictionary set fetched ahead of time for that locale;
    /// without it the whole set is fetched now. A failed fetch leaves the
    /// session usable with key fallbacks.
    pub async fn bootstrap(&self, initial: Option<DictionarySet>) -> Result<Locale, LocaleError> {
        let persisted = match self.preferences.persisted_locale().await {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(error = %err, "i18n: could not read persisted locale");
                None
            }
        };
        let locale = self.supported.resolve(persisted.as_deref());
        info!(%locale, "i18n: starting session");

        let generation = {
            let mut state = self.state();
            let generation = state.switch_to(locale.clone());
            match initial {
                Some(initial) => {
                    state.install_all(initial);
                    state.is_loading = false;
                    self.publish(&state);
                    return Ok(locale);
                }
                None => state.is_loading = true,
            }
            self.publish(&state);
            generation
        };

        self.load_locale(locale.clone(), generation).await?;
        Ok(locale)
    }

    /// Switches to `raw`, discarding every module loaded for the previous
    /// locale, and persists the choice.
    pub async fn set_locale(&self, raw: &str) -> Result<(), LocaleError> {
        let locale = self.supported.parse(raw)?;
        let generation = {
            let mut state = self.state();
            let generation = state.switch_to(locale.clone());
            state.is_loading = true;
            self.publish(&state);
            generation
        };
        info!(%locale, generation, "i18n: switching locale");

        if let Err(err) = self.preferences.persist_locale(&locale).await {
            warn!(%locale, error = %err, "i18n: failed to persist locale preference");
        }

        self.load_locale(locale, generation).await
    }

    async fn load_locale(&self, locale: Locale, generation: u64) -> Result<(), LocaleError> {
        let result = self.source.fetch_all_dictionaries(&locale).await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(%locale, "i18n: discarding dictionaries for superseded locale");
            return Err(LocaleError::Stale {
                requested: locale,
                module: None,
            });
        }
        state.is_loading = false;

        let outcome = match result {
            Ok(dictionaries) => {
                info!(%locale, modules = dictionaries.len(), "i18n: locale dictionaries loaded");
                state.install_all(dictionaries);
                Ok(())
            }
            Err(err) => {
                warn!(%locale, error = %err, "i18n: locale dictionaries failed to load");
                let err = LocaleError::FetchFailure {
                    locale,
                    module: None,
                    reason: format!("{err:#}"),
                };
                let _ = self.events.send(LocaleEvent::Error(err.to_string()));
                Err(err)
            }
        };
        self.publish(&state);
        outcome
    }

    /// Loads `module` for the current locale unless it is already present.
    pub async fn load_module(&self, module: &str) -> Result<Arc<Dictionary>, LocaleError> {
        let (pending, generation, locale) = {
            let mut state = self.state();
            if let Some(dictionary) = state.translations.get(module) {
                return Ok(Arc::clone(dictionary));
            }
            let pending = match state.in_flight.get(module) {
                Some(pending) => {
                    debug!(module, "i18n: joining in-flight module fetch");
                    pending.clone()
                }
                None => {
                    let pending = self.fetch_module(state.locale.clone(), module);
                    state
                        .in_flight
                        .insert(module.to_string(), pending.clone());
                    pending
                }
            };
            (pending, state.generation, state.locale.clone())
        };

        let result = pending.clone().await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(module, %locale, "i18n: discarding module for superseded locale");
            return Err(LocaleError::Stale {
                requested: locale,
                module: Some(module.to_string()),
            });
        }
        if state
            .in_flight
            .get(module)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            state.in_flight.remove(module);
        }

        match result {
            Ok(dictionary) => {
                if let Some(existing) = state.translations.get(module) {
                    return Ok(Arc::clone(existing));
                }
                state
                    .translations
                    .insert(module.to_string(), Arc::clone(&dictionary));
                info!(module, %locale, keys = dictionary.len(), "i18n: module loaded");
                let _ = self.events.send(LocaleEvent::ModuleLoaded {
                    locale,
                    module: module.to_string(),
                });
                self.publish(&state);
                Ok(dictionary)
            }
            Err(err) => {
                warn!(module, %locale, error = %err, "i18n: module failed to load");
                Err(err)
            }
        }
    }

    fn fetch_module(&self, locale: Locale, module: &str) -> PendingModule {
        let source = Arc::clone(&self.source);
        let module = module.to_string();
        async move {
            source
                .fetch_dictionary(&locale, &module)
                .await
                .map(Arc::new)
                .map_err(|err| LocaleError::FetchFailure {
                    locale,
                    module: Some(module),
                    reason: format!("{err:#}"),
                })
        }
        .boxed()
        .shared()
    }

    /// Looks up `key` in `module`, falling back to `default` and then to the
    /// key itself. Never fails.
    pub fn t(
        &self,
        module: &str,
        key: &str,
        default: Option<&str>,
        variables: Option<&Variables>,
    ) -> String {
        let resolved = {
            let state = self.state();
            state
                .translations
                .get(module)
                .and_then(|dictionary| dictionary.get(key))
                .cloned()
        };
        let text = resolved.unwrap_or_else(|| default.unwrap_or(key).to_string());
        match variables {
            Some(variables) => interpolate(&text, variables),
            None => text,
        }
    }

    /// A translation handle bound to one module.
    pub fn translator(self: &Arc<Self>, module: &str) -> ModuleTranslator {
        ModuleTranslator {
            controller: Arc::clone(self),
            module: Arc::from(module),
        }
    }
}

/// Module-scoped view of a [`LocaleController`].
#[derive(Clone)]
pub struct ModuleTranslator {
    controller: Arc<LocaleController>,
    module: Arc<str>,
}

impl ModuleTranslator {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn translate(&self, key: &str, default: Option<&str>, variables: Option<&Variables>) -> String {
        self.controller.t(&self.module, key, default, variables)
    }

    /// True until this module has loaded for the current locale.
    pub fn loading(&self) -> bool {
        !self.controller.is_module_loaded(&self.module)
    }

    pub fn locale(&self) -> Locale {
        self.controller.locale()
    }

    /// Loads the module if needed. Failures are logged and leave
    /// [`ModuleTranslator::loading`] true so a later call can retry.
    pub async fn ensure_loaded(&self) {
        if let Err(err) = self.controller.load_module(&self.module).await {
            debug!(module = %self.module, error = %err, "i18n: translator load did not complete");
        }
    }
}

/// Replaces `{name}` placeholders with `variables["name"]`. Unknown
/// placeholders and unbalanced braces are left as written.
pub fn interpolate(template: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "tests/locale_tests.rs"]
mod tests;
