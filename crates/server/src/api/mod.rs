use std::sync::Arc;

use shared::{
    domain::Track,
    error::ApiError,
    locale::Locale,
    protocol::{Dictionary, LocaleDictionaries},
};

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct ApiContext {
    pub catalog: Arc<Catalog>,
}

pub fn list_tracks(ctx: &ApiContext) -> Vec<Track> {
    ctx.catalog.tracks().to_vec()
}

/// Locale tags and module names are path segments and file stems; only ASCII
/// alphanumerics, `-` and `_` are accepted.
fn validate_segment(kind: &str, value: &str) -> Result<(), ApiError> {
    let valid = !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::validation(format!("invalid {kind} '{value}'")))
    }
}

fn parse_locale(raw: &str) -> Result<Locale, ApiError> {
    let locale = Locale::new(raw);
    validate_segment("locale", locale.as_str())?;
    Ok(locale)
}

pub fn locale_dictionaries(ctx: &ApiContext, locale: &str) -> Result<LocaleDictionaries, ApiError> {
    let locale = parse_locale(locale)?;
    let modules = ctx
        .catalog
        .locale(&locale)
        .ok_or_else(|| ApiError::not_found(format!("unknown locale '{locale}'")))?;
    Ok(LocaleDictionaries {
        locale: Some(locale),
        modules: modules.clone(),
    })
}

pub fn module_dictionary(ctx: &ApiContext, locale: &str, module: &str) -> Result<Dictionary, ApiError> {
    let locale = parse_locale(locale)?;
    validate_segment("module", module)?;
    if ctx.catalog.locale(&locale).is_none() {
        return Err(ApiError::not_found(format!("unknown locale '{locale}'")));
    }
    ctx.catalog
        .module(&locale, module)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("no '{module}' dictionary for '{locale}'")))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
