use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    locale::Locale,
    protocol::{
        locale_dictionaries_route, module_dictionary_route, Dictionary, DictionarySet,
        LocaleDictionaries,
    },
};
use tracing::debug;

/// Where translation dictionaries come from.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn fetch_dictionary(&self, locale: &Locale, module: &str) -> Result<Dictionary>;
    async fn fetch_all_dictionaries(&self, locale: &Locale) -> Result<DictionarySet>;
}

/// Fetches dictionaries from the backend's `/i18n` routes.
pub struct HttpDictionarySource {
    http: Client,
    server_url: String,
}

impl HttpDictionarySource {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }
}

#[async_trait]
impl DictionarySource for HttpDictionarySource {
    async fn fetch_dictionary(&self, locale: &Locale, module: &str) -> Result<Dictionary> {
        let url = format!(
            "{}{}",
            self.server_url,
            module_dictionary_route(locale, module)
        );
        debug!(%url, "i18n: fetching module dictionary");
        let dictionary = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?
            .json::<Dictionary>()
            .await
            .with_context(|| format!("invalid dictionary payload from {url}"))?;
        Ok(dictionary)
    }

    async fn fetch_all_dictionaries(&self, locale: &Locale) -> Result<DictionarySet> {
        let url = format!("{}{}", self.server_url, locale_dictionaries_route(locale));
        debug!(%url, "i18n: fetching locale dictionaries");
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?
            .json::<LocaleDictionaries>()
            .await
            .with_context(|| format!("invalid dictionary payload from {url}"))?;
        Ok(body.modules)
    }
}

/// Serves dictionaries held in memory, e.g. bundled with the binary.
#[derive(Debug, Clone, Default)]
pub struct StaticDictionarySource {
    locales: HashMap<Locale, DictionarySet>,
}

impl StaticDictionarySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, locale: Locale, module: &str, dictionary: Dictionary) -> Self {
        self.locales
            .entry(locale)
            .or_default()
            .insert(module.to_string(), dictionary);
        self
    }
}

#[async_trait]
impl DictionarySource for StaticDictionarySource {
    async fn fetch_dictionary(&self, locale: &Locale, module: &str) -> Result<Dictionary> {
        self.locales
            .get(locale)
            .and_then(|modules| modules.get(module))
            .cloned()
            .ok_or_else(|| anyhow!("no '{module}' dictionary bundled for locale {locale}"))
    }

    async fn fetch_all_dictionaries(&self, locale: &Locale) -> Result<DictionarySet> {
        self.locales
            .get(locale)
            .cloned()
            .ok_or_else(|| anyhow!("no dictionaries bundled for locale {locale}"))
    }
}

pub struct MissingDictionarySource;

#[async_trait]
impl DictionarySource for MissingDictionarySource {
    async fn fetch_dictionary(&self, locale: &Locale, module: &str) -> Result<Dictionary> {
        Err(anyhow!(
            "dictionary source unavailable for '{module}' ({locale})"
        ))
    }

    async fn fetch_all_dictionaries(&self, locale: &Locale) -> Result<DictionarySet> {
        Err(anyhow!("dictionary source unavailable for {locale}"))
    }
}

#[cfg(test)]
#[path = "tests/dictionary_tests.rs"]
mod tests;
