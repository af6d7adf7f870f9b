//! Action registry: the ordered set of actions and the dispatcher that picks
//! the action for a line of a scenario.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::debug;

use phrase_core::{RunnerError, RunnerResult};

use crate::action::{Action, ActionPattern, AnchoredRegex, Captures};
use crate::context::ExecutionContext;
use crate::element_actions::ElementClickAction;
use crate::language::{getter_for, LanguageGetter};
use crate::page_actions::{
    PageAmInAction, PageGoToAction, PageSeeTitleAction, PageWaitForPageToLoadAction,
};

static GLOBAL: OnceCell<ActionRegistry> = OnceCell::new();

enum Matcher {
    /// Compiled at registration.
    Literal(AnchoredRegex),
    /// Catalog key, resolved per language at dispatch.
    Localized(String),
}

struct RegisteredAction {
    action: Arc<dyn Action>,
    matcher: Matcher,
}

/// The action chosen for a line, with the groups its pattern captured.
#[derive(Clone)]
pub struct MatchResult {
    pub action: Arc<dyn Action>,
    pub captures: Captures,
}

impl MatchResult {
    pub fn action_name(&self) -> &'static str {
        self.action.name()
    }
}

impl std::fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchResult")
            .field("action", &self.action.name())
            .field("captures", &self.captures)
            .finish()
    }
}

/// Registered actions in registration order. Earlier registrations win when
/// more than one pattern matches a line.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<RegisteredAction>,
    names: HashSet<&'static str>,
    /// Localized patterns compiled on first use, keyed by the resolved text.
    localized: DashMap<String, Arc<AnchoredRegex>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in actions.
    pub fn builtin() -> RunnerResult<Self> {
        let mut registry = Self::new();
        registry.register(PageGoToAction)?;
        registry.register(PageAmInAction)?;
        registry.register(PageSeeTitleAction)?;
        registry.register(PageWaitForPageToLoadAction)?;
        registry.register(ElementClickAction)?;
        Ok(registry)
    }

    /// Process-wide registry of the built-in actions, built on first use.
    pub fn global() -> RunnerResult<&'static ActionRegistry> {
        GLOBAL.get_or_try_init(Self::builtin)
    }

    pub fn register<A: Action + 'static>(&mut self, action: A) -> RunnerResult<()> {
        self.register_arc(Arc::new(action))
    }

    /// Validate and append an action. Abstract actions are skipped.
    pub fn register_arc(&mut self, action: Arc<dyn Action>) -> RunnerResult<()> {
        let name = action.name();
        if action.is_abstract() {
            debug!(action = name, "Skipping abstract action");
            return Ok(());
        }

        let definition_error = |reason: String| RunnerError::Definition {
            action: name.to_string(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(definition_error("the action has no name".into()));
        }
        if self.names.contains(name) {
            return Err(definition_error("an action with this name is already registered".into()));
        }

        let pattern = action.pattern();
        if pattern.is_empty() {
            return Err(definition_error("the action has an empty pattern".into()));
        }
        debug!(action = name, pattern = %pattern, "Registering action");
        let matcher = match pattern {
            ActionPattern::Literal(p) => Matcher::Literal(
                AnchoredRegex::new(&p).map_err(|e| definition_error(e.to_string()))?,
            ),
            ActionPattern::LanguageItem(key) => Matcher::Localized(key),
        };

        self.names.insert(name);
        self.actions.push(RegisteredAction { action, matcher });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|r| r.action.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions
            .iter()
            .find(|r| r.action.name() == name)
            .map(|r| Arc::clone(&r.action))
    }

    /// Find the first action whose pattern matches the start of `line`.
    ///
    /// `getter` overrides the built-in getter for `language`. A language item
    /// the getter does not know fails the whole lookup; later actions are not
    /// tried. `Ok(None)` means no action recognizes the line.
    pub fn suitable_for(
        &self,
        line: &str,
        language: &str,
        getter: Option<&dyn LanguageGetter>,
    ) -> RunnerResult<Option<MatchResult>> {
        let getter = match getter {
            Some(getter) => getter,
            None => getter_for(language)? as &dyn LanguageGetter,
        };

        for registered in &self.actions {
            let localized;
            let regex = match &registered.matcher {
                Matcher::Literal(regex) => regex,
                Matcher::Localized(key) => {
                    let pattern =
                        getter
                            .get(key)
                            .ok_or_else(|| RunnerError::LanguageDoesNotResolve {
                                language: language.to_string(),
                                key: key.clone(),
                            })?;
                    localized = self.compile_localized(pattern)?;
                    &*localized
                }
            };

            if let Some(captures) = regex.captures(line) {
                debug!(action = registered.action.name(), line, "Matched action line");
                return Ok(Some(MatchResult {
                    action: Arc::clone(&registered.action),
                    captures,
                }));
            }
        }

        debug!(line, language, "No action matches line");
        Ok(None)
    }

    /// Left-anchored match of a registered action's literal pattern against
    /// `text`, reusing the regex compiled at registration. Localized and
    /// unknown actions answer `false`.
    pub fn can_resolve(&self, name: &str, text: &str) -> bool {
        self.actions
            .iter()
            .find(|r| r.action.name() == name)
            .is_some_and(|r| match &r.matcher {
                Matcher::Literal(regex) => regex.is_match(text),
                Matcher::Localized(_) => false,
            })
    }

    fn compile_localized(&self, pattern: &str) -> RunnerResult<Arc<AnchoredRegex>> {
        if let Some(regex) = self.localized.get(pattern) {
            return Ok(Arc::clone(regex.value()));
        }
        let regex = Arc::new(AnchoredRegex::new(pattern)?);
        self.localized.insert(pattern.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    /// Run a matched action against `context`.
    pub fn invoke(&self, matched: &MatchResult, context: &mut ExecutionContext) -> RunnerResult<()> {
        debug!(action = matched.action_name(), "Executing action");
        matched.action.execute(context, &matched.captures)
    }

    /// Resolve `line` in the context's language and run the action it names.
    /// Returns the name of the action that ran, or `None` when no action
    /// recognizes the line.
    pub fn execute_line(
        &self,
        line: &str,
        context: &mut ExecutionContext,
    ) -> RunnerResult<Option<&'static str>> {
        let language = context.language().to_string();
        let getter = context.getter_override();
        match self.suitable_for(line, &language, getter.as_deref())? {
            Some(matched) => {
                self.invoke(&matched, context)?;
                Ok(Some(matched.action_name()))
            }
            None => Ok(None),
        }
    }

    /// Run `line` on behalf of `caller`, an action that is already executing.
    /// Fails with [`RunnerError::RecursiveDispatch`] when the line resolves
    /// back to `caller` itself.
    ///
    /// `getter` overrides the context's getter both for matching the line and
    /// while the matched action runs.
    pub fn execute_action(
        &self,
        caller: &dyn Action,
        line: &str,
        context: &mut ExecutionContext,
        getter: Option<Arc<dyn LanguageGetter>>,
    ) -> RunnerResult<Option<&'static str>> {
        let language = context.language().to_string();
        let resolver = getter.clone().or_else(|| context.getter_override());
        let Some(matched) = self.suitable_for(line, &language, resolver.as_deref())? else {
            return Ok(None);
        };
        if matched.action_name() == caller.name() {
            return Err(RunnerError::RecursiveDispatch(caller.name().to_string()));
        }

        let previous = getter.map(|getter| context.replace_getter(Some(getter)));
        let result = self.invoke(&matched, context);
        if let Some(previous) = previous {
            context.replace_getter(previous);
        }
        result?;
        Ok(Some(matched.action_name()))
    }
}
