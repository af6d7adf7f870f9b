//! Language catalogs: per-language tables that turn symbolic keys into
//! concrete action patterns and failure messages.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::warn;

use phrase_core::{RunnerError, RunnerResult};

/// Resolves symbolic keys for one natural language.
pub trait LanguageGetter: Send + Sync {
    /// Identifier of the language this getter resolves, e.g. `en-us`.
    fn language(&self) -> &str;

    /// Look up the value registered under `key`.
    fn get(&self, key: &str) -> Option<&str>;

    /// Look up a message template and substitute its `{name}` placeholders
    /// in a single pass. Substituted values are never expanded again;
    /// placeholders without an argument are left as written.
    fn format(&self, key: &str, args: &[(&str, &str)]) -> Option<String> {
        let template = self.get(key)?;
        let Some(placeholder) = (*PLACEHOLDER).as_ref() else {
            return Some(template.to_string());
        };
        let message = placeholder.replace_all(template, |caps: &Captures<'_>| {
            args.iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        });
        Some(message.into_owned())
    }
}

static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\{(\w+)\}").ok());

/// A getter backed by a `key = value` catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogGetter {
    language: String,
    entries: HashMap<String, String>,
}

impl CatalogGetter {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            entries: HashMap::new(),
        }
    }

    /// Parse a catalog. Blank lines and `#` comments are ignored; lines
    /// without a `=` separator are logged and skipped.
    pub fn parse(language: impl Into<String>, source: &str) -> Self {
        let mut getter = Self::new(language);
        for (number, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    getter.insert(key.trim(), value.trim());
                }
                _ => warn!(
                    language = %getter.language,
                    line = number + 1,
                    "Skipping malformed catalog line"
                ),
            }
        }
        getter
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LanguageGetter for CatalogGetter {
    fn language(&self) -> &str {
        &self.language
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

static AVAILABLE_GETTERS: Lazy<HashMap<String, CatalogGetter>> = Lazy::new(|| {
    [
        ("en-us", include_str!("../languages/en-us.txt")),
        ("pt-br", include_str!("../languages/pt-br.txt")),
    ]
    .into_iter()
    .map(|(language, source)| (language.to_string(), CatalogGetter::parse(language, source)))
    .collect()
});

/// Process-wide table of the built-in getters, keyed by language.
pub fn available_getters() -> &'static HashMap<String, CatalogGetter> {
    &AVAILABLE_GETTERS
}

/// Built-in getter for `language`.
pub fn getter_for(language: &str) -> RunnerResult<&'static CatalogGetter> {
    AVAILABLE_GETTERS
        .get(language)
        .ok_or_else(|| RunnerError::UnknownLanguage(language.to_string()))
}
