//! Page actions: navigation between pages and checks on the loaded page.

use tracing::info;

use phrase_core::{RunnerError, RunnerResult};

use crate::action::{Action, ActionPattern, Captures};
use crate::context::ExecutionContext;

fn target<'a>(captures: &'a Captures) -> &'a str {
    captures.argument("url").map(str::trim).unwrap_or_default()
}

/// Open a page by registered name or by address.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageGoToAction;

impl Action for PageGoToAction {
    fn name(&self) -> &'static str {
        "PageGoToAction"
    }

    fn pattern(&self) -> ActionPattern {
        ActionPattern::language_item("page_go_to_regex")
    }

    fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()> {
        let target = target(captures);
        if target.is_empty() {
            return Err(RunnerError::action_failed(
                context.message("page_go_to_failure", &[("url", target)]),
            ));
        }

        let resolved = context.pages().resolve(&context.settings, target)?;
        context.open(&resolved.url)?;
        info!(url = %resolved.url, page = ?resolved.page.as_ref().map(|p| &p.name), "Opened page");

        context.url = Some(resolved.url);
        context.current_page = resolved.page;
        Ok(())
    }
}

/// Like [`PageGoToAction`], but only for registered pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAmInAction;

impl Action for PageAmInAction {
    fn name(&self) -> &'static str {
        "PageAmInAction"
    }

    fn pattern(&self) -> ActionPattern {
        ActionPattern::language_item("page_am_in_regex")
    }

    fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()> {
        let target = target(captures);
        let resolved = context.pages().resolve(&context.settings, target)?;
        let Some(page) = resolved.page else {
            return Err(RunnerError::action_failed(
                context.message("page_am_in_failure", &[("url", target)]),
            ));
        };

        context.open(&resolved.url)?;
        info!(url = %resolved.url, page = %page.name, "Now in page");

        context.url = Some(resolved.url);
        context.current_page = Some(page);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageSeeTitleAction;

impl Action for PageSeeTitleAction {
    fn name(&self) -> &'static str {
        "PageSeeTitleAction"
    }

    fn pattern(&self) -> ActionPattern {
        ActionPattern::language_item("page_see_title_regex")
    }

    fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()> {
        let expected = captures.argument("title").unwrap_or_default();
        let actual = context.browser_driver.title()?;
        if actual != expected {
            return Err(RunnerError::action_failed(context.message(
                "page_see_title_failure",
                &[("expected", expected), ("actual", actual.as_str())],
            )));
        }
        Ok(())
    }
}

/// Wait for the page to load, for the given seconds or the configured timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageWaitForPageToLoadAction;

impl Action for PageWaitForPageToLoadAction {
    fn name(&self) -> &'static str {
        "PageWaitForPageToLoadAction"
    }

    fn pattern(&self) -> ActionPattern {
        ActionPattern::language_item("page_wait_for_page_regex")
    }

    fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()> {
        let timeout_ms = match captures.get("timeout") {
            Some(seconds) => seconds
                .parse::<u64>()
                .ok()
                .and_then(|s| s.checked_mul(1000))
                .ok_or_else(|| {
                    RunnerError::action_failed(
                        context.message("page_wait_for_page_failure", &[("timeout", seconds)]),
                    )
                })?,
            None => context.settings.page_timeout_ms,
        };
        context.browser_driver.wait_for_page(timeout_ms)?;
        Ok(())
    }
}
