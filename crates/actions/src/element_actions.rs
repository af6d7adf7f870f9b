//! Element actions: interactions with named elements of the current page.

use tracing::info;

use phrase_core::{RunnerError, RunnerResult};

use crate::action::{Action, ActionPattern, Captures};
use crate::context::ExecutionContext;
use crate::language::LanguageGetter;
use crate::page_objects::ElementType;

/// Map the localized element word of an action line to its type.
fn clickable_type(getter: &dyn LanguageGetter, word: &str) -> Option<ElementType> {
    [
        ("element_type_button", ElementType::Button),
        ("element_type_link", ElementType::Link),
    ]
    .into_iter()
    .find(|(key, _)| getter.get(key) == Some(word))
    .map(|(_, element_type)| element_type)
}

/// Click a button or link. The element name is looked up on the current
/// page; names the page does not define are used as selectors directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementClickAction;

impl Action for ElementClickAction {
    fn name(&self) -> &'static str {
        "ElementClickAction"
    }

    fn pattern(&self) -> ActionPattern {
        ActionPattern::language_item("element_click_regex")
    }

    fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()> {
        let name = captures.argument("element_name").unwrap_or_default();
        let word = captures.get("element_type").unwrap_or_default();
        let Some(element_type) = clickable_type(context.getter()?, word) else {
            return Err(RunnerError::action_failed(
                context.message("element_click_failure", &[("element_type", word)]),
            ));
        };

        let selector = context
            .current_page
            .as_ref()
            .and_then(|page| page.element(name))
            .map_or(name, |element| element.selector.as_str())
            .to_string();

        context.browser_driver.click(&selector)?;
        info!(element = name, selector = %selector, "Clicked element");

        if element_type == ElementType::Link {
            let timeout_ms = context.settings.page_timeout_ms;
            context.browser_driver.wait_for_page(timeout_ms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DriverCall, RecordingDriver};
    use crate::page_objects::Page;

    #[test]
    fn test_click_uses_page_element_selector() {
        let driver = RecordingDriver::new();
        let calls = driver.calls();
        let mut context = ExecutionContext::new("en-us", Box::new(driver));
        context.current_page = Some(Page::new("Login", "/login").with_element(
            "Sign in",
            "button[type='submit']",
            ElementType::Button,
        ));

        ElementClickAction
            .execute(
                &mut context,
                &Captures::from_named([("element_name", "Sign in"), ("element_type", "button")]),
            )
            .unwrap();

        assert_eq!(
            *calls.lock(),
            vec![DriverCall::Click {
                selector: "button[type='submit']".into()
            }]
        );
    }

    #[test]
    fn test_click_link_waits_for_page() {
        let driver = RecordingDriver::new();
        let calls = driver.calls();
        let mut context = ExecutionContext::new("pt-br", Box::new(driver));

        ElementClickAction
            .execute(
                &mut context,
                &Captures::from_named([("element_name", "#home"), ("element_type", "link")]),
            )
            .unwrap();

        assert_eq!(
            *calls.lock(),
            vec![
                DriverCall::Click {
                    selector: "#home".into()
                },
                DriverCall::WaitForPage { timeout_ms: 30_000 },
            ]
        );
    }

    #[test]
    fn test_localized_element_type() {
        let getter = crate::language::getter_for("pt-br").unwrap();
        assert_eq!(clickable_type(getter, "botão"), Some(ElementType::Button));
        assert_eq!(clickable_type(getter, "button"), None);
    }

    #[test]
    fn test_unknown_element_type_fails() {
        let mut context = ExecutionContext::new("en-us", Box::new(RecordingDriver::new()));
        let err = ElementClickAction
            .execute(
                &mut context,
                &Captures::from_named([("element_name", "x"), ("element_type", "checkbox")]),
            )
            .unwrap_err();
        assert!(matches!(err, RunnerError::ActionFailed(_)));
    }
}
