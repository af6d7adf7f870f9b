//! Integration tests for resolving action lines and running them against a
//! recording browser driver.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use phrase_actions::page_actions::PageGoToAction;
    use phrase_actions::*;
    use phrase_core::{RunnerError, RunnerResult};

    /// Navigation bound to a plain, non-localized pattern.
    struct NavigateAction;

    impl Action for NavigateAction {
        fn name(&self) -> &'static str {
            "NavigateAction"
        }

        fn pattern(&self) -> ActionPattern {
            ActionPattern::literal(r#"^I go to "(.*)"$"#)
        }

        fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()> {
            PageGoToAction.execute(context, captures)
        }
    }

    fn context(driver: RecordingDriver) -> ExecutionContext {
        let pages = PageRegistry::new().with_page(Page::new("Some Page", "some"));
        ExecutionContext::new("en-us", Box::new(driver)).with_pages(Arc::new(pages))
    }

    #[test]
    fn test_literal_navigation_line() {
        let mut registry = ActionRegistry::new();
        registry.register(NavigateAction).unwrap();
        assert!(NavigateAction.can_resolve(r#"I go to "some_url""#));

        let driver = RecordingDriver::new();
        let calls = driver.calls();
        let mut context = context(driver);

        let matched = registry
            .suitable_for(r#"I go to "some_url""#, context.language(), None)
            .unwrap()
            .expect("line should match");
        assert_eq!(matched.action_name(), "NavigateAction");
        assert_eq!(matched.captures.positional(), &[Some("some_url".to_string())]);

        registry.invoke(&matched, &mut context).unwrap();

        assert_eq!(context.url.as_deref(), Some("some_url"));
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
    fn test_page_name_resolves_to_page_url() {
        let registry = ActionRegistry::global().unwrap();
        let driver = RecordingDriver::new();
        let calls = driver.calls();
        let mut context = context(driver);

        let ran = registry
            .execute_line(r#"I go to "Some Page""#, &mut context)
            .unwrap();

        assert_eq!(ran, Some("PageGoToAction"));
        assert_eq!(context.url.as_deref(), Some("some"));
        assert_eq!(
            context.current_page.as_ref().map(|p| p.name.as_str()),
            Some("Some Page")
        );
        assert_eq!(calls.lock()[0], DriverCall::PageOpen { url: "some".into() });
    }

    #[test]
    fn test_base_url_applies_to_pages() {
        let registry = ActionRegistry::global().unwrap();
        let settings = Settings {
            base_url: Some("http://localhost:8000".into()),
            ..Settings::default()
        };
        let mut context = context(RecordingDriver::new()).with_settings(settings);

        registry
            .execute_line(r#"I am in the "Some Page" page"#, &mut context)
            .unwrap();

        assert_eq!(context.url.as_deref(), Some("http://localhost:8000/some"));
    }

    #[test]
    fn test_unresolved_key_is_not_skipped() {
        let mut registry = ActionRegistry::new();
        registry.register(PageGoToAction).unwrap();
        registry.register(NavigateAction).unwrap();

        let getter = CatalogGetter::new("en-us");
        let err = registry
            .suitable_for(r#"I go to "some_url""#, "en-us", Some(&getter))
            .unwrap_err();
        assert!(matches!(err, RunnerError::LanguageDoesNotResolve { .. }));
    }

    #[test]
    fn test_full_scenario_file() {
        let source = r#"
Scenario: Reach the login form
    I go to "Some Page"
    And I click "Sign in" button
    I wait for the page to load for 2 seconds
    I see "Sign in" title
"#;
        let scenarios = parse_scenarios(source, getter_for("en-us").unwrap());
        assert_eq!(scenarios.len(), 1);

        let registry = ActionRegistry::global().unwrap();
        let driver = RecordingDriver::new().with_title("Sign in");
        let calls = driver.calls();
        let mut context = context(driver);

        let run = ScenarioRunner::new(registry)
            .run(&scenarios[0], &mut context)
            .unwrap();

        assert!(run.passed(), "{run:?}");
        assert_eq!(
            *calls.lock(),
            vec![
                DriverCall::PageOpen { url: "some".into() },
                DriverCall::WaitForPage { timeout_ms: 30_000 },
                DriverCall::Click {
                    selector: "Sign in".into()
                },
                DriverCall::WaitForPage { timeout_ms: 2_000 },
                DriverCall::Title,
            ]
        );
    }
}
