//! Execution context: the session state threaded through every action of a
//! test run, and the browser driver capability actions call into.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use phrase_core::{RunnerConfig, RunnerResult};

use crate::language::{getter_for, LanguageGetter};
use crate::page_objects::{Page, PageRegistry};

/// Browser automation primitives. Implementations talk to a real browser;
/// the core treats every call as an opaque synchronous operation.
pub trait BrowserDriver: Send {
    fn page_open(&mut self, url: &str) -> anyhow::Result<()>;
    fn wait_for_page(&mut self, timeout_ms: u64) -> anyhow::Result<()>;
    fn title(&mut self) -> anyhow::Result<String>;
    fn click(&mut self, selector: &str) -> anyhow::Result<()>;
}

/// A call received by a [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DriverCall {
    PageOpen { url: String },
    WaitForPage { timeout_ms: u64 },
    Title,
    Click { selector: String },
}

/// Driver that performs nothing and records every call in order. Used for
/// dry runs and as the test double for actions.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    calls: Arc<Mutex<Vec<DriverCall>>>,
    title: String,
    unreachable: Vec<String>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title reported for any page.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Make `page_open` fail for `url`.
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.push(url.into());
        self
    }

    /// Shared handle on the recorded calls; stays valid after the driver is
    /// moved into a context.
    pub fn calls(&self) -> Arc<Mutex<Vec<DriverCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: DriverCall) {
        self.calls.lock().push(call);
    }
}

impl BrowserDriver for RecordingDriver {
    fn page_open(&mut self, url: &str) -> anyhow::Result<()> {
        self.record(DriverCall::PageOpen { url: url.into() });
        if self.unreachable.iter().any(|u| u == url) {
            anyhow::bail!("could not open {url}");
        }
        Ok(())
    }

    fn wait_for_page(&mut self, timeout_ms: u64) -> anyhow::Result<()> {
        self.record(DriverCall::WaitForPage { timeout_ms });
        Ok(())
    }

    fn title(&mut self) -> anyhow::Result<String> {
        self.record(DriverCall::Title);
        Ok(self.title.clone())
    }

    fn click(&mut self, selector: &str) -> anyhow::Result<()> {
        self.record(DriverCall::Click {
            selector: selector.into(),
        });
        Ok(())
    }
}

/// Session-scoped settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub base_url: Option<String>,
    pub page_timeout_ms: u64,
    /// Free-form values set by the run driver or by actions.
    pub values: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl Settings {
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            page_timeout_ms: config.page_timeout_ms,
            values: HashMap::new(),
        }
    }
}

/// Mutable state of one test run.
pub struct ExecutionContext {
    language: String,
    pub browser_driver: Box<dyn BrowserDriver>,
    pub url: Option<String>,
    pub current_page: Option<Page>,
    pub settings: Settings,
    pages: Arc<PageRegistry>,
    /// Used instead of the built-in getter for `language` when set.
    getter: Option<Arc<dyn LanguageGetter>>,
}

impl ExecutionContext {
    pub fn new(language: impl Into<String>, browser_driver: Box<dyn BrowserDriver>) -> Self {
        Self {
            language: language.into(),
            browser_driver,
            url: None,
            current_page: None,
            settings: Settings::default(),
            pages: Arc::new(PageRegistry::new()),
            getter: None,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_pages(mut self, pages: Arc<PageRegistry>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_getter(mut self, getter: Arc<dyn LanguageGetter>) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Swap the getter override, returning the previous one.
    pub fn replace_getter(
        &mut self,
        getter: Option<Arc<dyn LanguageGetter>>,
    ) -> Option<Arc<dyn LanguageGetter>> {
        std::mem::replace(&mut self.getter, getter)
    }

    pub fn getter_override(&self) -> Option<Arc<dyn LanguageGetter>> {
        self.getter.clone()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn pages(&self) -> Arc<PageRegistry> {
        Arc::clone(&self.pages)
    }

    /// The getter override, else the built-in getter for the current
    /// language.
    pub fn getter(&self) -> RunnerResult<&dyn LanguageGetter> {
        if let Some(getter) = &self.getter {
            return Ok(&**getter);
        }
        let builtin: &dyn LanguageGetter = getter_for(&self.language)?;
        Ok(builtin)
    }

    /// Localized message for `key`. Falls back to the key and its arguments
    /// when the language has no such message.
    pub fn message(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.getter()
            .ok()
            .and_then(|g| g.format(key, args))
            .unwrap_or_else(|| {
                let rendered: Vec<String> = args.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{key} ({})", rendered.join(", "))
            })
    }

    /// Open `url` and wait for it to load.
    pub fn open(&mut self, url: &str) -> RunnerResult<()> {
        self.browser_driver.page_open(url)?;
        self.browser_driver.wait_for_page(self.settings.page_timeout_ms)?;
        Ok(())
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("language", &self.language)
            .field("url", &self.url)
            .field("current_page", &self.current_page.as_ref().map(|p| &p.name))
            .field("settings", &self.settings)
            .field("getter", &self.getter.as_ref().map(|g| g.language()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::CatalogGetter;

    #[test]
    fn test_recording_driver_keeps_order() {
        let driver = RecordingDriver::new();
        let calls = driver.calls();
        let mut context = ExecutionContext::new("en-us", Box::new(driver));

        context.open("some_url").unwrap();

        assert_eq!(
            *calls.lock(),
            vec![
                DriverCall::PageOpen {
                    url: "some_url".into()
                },
                DriverCall::WaitForPage { timeout_ms: 30_000 },
            ]
        );
    }

    #[test]
    fn test_unreachable_page_is_driver_error() {
        let driver = RecordingDriver::new().with_unreachable("down");
        let mut context = ExecutionContext::new("en-us", Box::new(driver));
        let err = context.open("down").unwrap_err();
        assert!(err.is_action_failure());
    }

    #[test]
    fn test_message_localized_and_fallback() {
        let mut context = ExecutionContext::new("en-us", Box::new(RecordingDriver::new()));
        let message = context.message("page_am_in_failure", &[("url", "Nowhere")]);
        assert_eq!(message, "\"Nowhere\" is not a registered page.");

        context.set_language("pt-br");
        let message = context.message("page_am_in_failure", &[("url", "Nowhere")]);
        assert_eq!(message, "\"Nowhere\" não é uma página registrada.");

        context.set_language("xx-yy");
        let message = context.message("page_am_in_failure", &[("url", "Nowhere")]);
        assert_eq!(message, "page_am_in_failure (url=Nowhere)");
    }

    #[test]
    fn test_getter_override_serves_messages() {
        let getter = CatalogGetter::new("fr-fr")
            .with_entry("page_am_in_failure", "\"{url}\" n'est pas une page enregistrée.");
        let mut context = ExecutionContext::new("fr-fr", Box::new(RecordingDriver::new()))
            .with_getter(Arc::new(getter));

        assert_eq!(context.getter().unwrap().language(), "fr-fr");
        assert_eq!(
            context.message("page_am_in_failure", &[("url", "Accueil")]),
            "\"Accueil\" n'est pas une page enregistrée."
        );

        let previous = context.replace_getter(None);
        assert!(previous.is_some());
        assert!(matches!(
            context.getter(),
            Err(phrase_core::RunnerError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let config = RunnerConfig {
            base_url: Some("http://localhost".into()),
            page_timeout_ms: 5000,
            ..RunnerConfig::default()
        };
        let settings = Settings::from_config(&config);
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost"));
        assert_eq!(settings.page_timeout_ms, 5000);
        assert!(settings.values.is_empty());
    }
}
