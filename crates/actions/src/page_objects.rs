//! Page object models: named pages with their address and the elements
//! scenarios refer to by name.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use phrase_core::{RunnerError, RunnerResult};

use crate::context::Settings;

/// Kind of clickable element. Clicking a link waits for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Button,
    Link,
}

/// An element on a page that can be interacted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElement {
    pub name: String,
    pub selector: String,
    pub element_type: ElementType,
}

/// A page scenarios can navigate to by its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub url: String,
    pub elements: Vec<PageElement>,
}

impl Page {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(
        mut self,
        name: impl Into<String>,
        selector: impl Into<String>,
        element_type: ElementType,
    ) -> Self {
        self.elements.push(PageElement {
            name: name.into(),
            selector: selector.into(),
            element_type,
        });
        self
    }

    /// Find an element by name.
    pub fn element(&self, name: &str) -> Option<&PageElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// Outcome of resolving a navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The page registered under the target name, if any.
    pub page: Option<Page>,
    /// Address to open.
    pub url: String,
}

/// Pages known to a test run, looked up by display name.
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: Vec<Page>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page. A page registered under an existing name replaces it.
    pub fn register(&mut self, page: Page) {
        debug!(page = %page.name, url = %page.url, "Registering page");
        match self.pages.iter_mut().find(|p| p.name == page.name) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.register(page);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Resolve a target that is either a page name or an address. Relative
    /// addresses are joined to the configured base URL when there is one.
    pub fn resolve(&self, settings: &Settings, target: &str) -> RunnerResult<ResolvedTarget> {
        let page = self.get(target).cloned();
        let raw = page.as_ref().map_or(target, |p| p.url.as_str());
        let url = join_base_url(settings.base_url.as_deref(), raw)?;
        Ok(ResolvedTarget { page, url })
    }
}

fn join_base_url(base_url: Option<&str>, target: &str) -> RunnerResult<String> {
    let base = match base_url {
        Some(base) if Url::parse(target).is_err() => base,
        _ => return Ok(target.to_string()),
    };

    let base = if base.ends_with('/') {
        Url::parse(base)
    } else {
        Url::parse(&format!("{base}/"))
    }
    .map_err(|e| invalid_base_url(base, e))?;

    base.join(target.trim_start_matches('/'))
        .map(String::from)
        .map_err(|e| invalid_base_url(base.as_str(), e))
}

fn invalid_base_url(base: &str, err: url::ParseError) -> RunnerError {
    RunnerError::Config(config::ConfigError::Message(format!(
        "invalid base url {base:?}: {err}"
    )))
}
