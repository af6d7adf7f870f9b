//! Action descriptors: a pattern that recognizes an action line and the
//! behavior that runs when it does.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use phrase_core::{RunnerError, RunnerResult};

use crate::context::ExecutionContext;
use crate::language::LanguageGetter;

/// How an action recognizes its lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionPattern {
    /// A regular expression used as is.
    Literal(String),
    /// A key resolved per language into a regular expression.
    LanguageItem(String),
}

impl ActionPattern {
    pub fn literal(pattern: impl Into<String>) -> Self {
        ActionPattern::Literal(pattern.into())
    }

    pub fn language_item(key: impl Into<String>) -> Self {
        ActionPattern::LanguageItem(key.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ActionPattern::Literal(p) | ActionPattern::LanguageItem(p) => p.trim().is_empty(),
        }
    }

    /// Left-anchored match of a literal pattern. Language items need a getter
    /// and never match here; see [`ActionPattern::resolves_with`].
    /// A literal that does not compile never matches.
    pub fn can_resolve(&self, text: &str) -> bool {
        match self {
            ActionPattern::Literal(pattern) => match AnchoredRegex::new(pattern) {
                Ok(regex) => regex.is_match(text),
                Err(e) => {
                    warn!(error = %e, "Literal action pattern does not compile");
                    false
                }
            },
            ActionPattern::LanguageItem(_) => false,
        }
    }

    /// The concrete regular expression for the getter's language.
    pub fn resolve<'a>(&'a self, getter: &'a dyn LanguageGetter) -> RunnerResult<&'a str> {
        match self {
            ActionPattern::Literal(pattern) => Ok(pattern.as_str()),
            ActionPattern::LanguageItem(key) => {
                getter
                    .get(key)
                    .ok_or_else(|| RunnerError::LanguageDoesNotResolve {
                        language: getter.language().to_string(),
                        key: key.clone(),
                    })
            }
        }
    }

    /// Left-anchored match after resolving through `getter`.
    pub fn resolves_with(&self, getter: &dyn LanguageGetter, text: &str) -> RunnerResult<bool> {
        let regex = AnchoredRegex::new(self.resolve(getter)?)?;
        Ok(regex.is_match(text))
    }
}

impl fmt::Display for ActionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPattern::Literal(pattern) => write!(f, "{pattern}"),
            ActionPattern::LanguageItem(key) => write!(f, "<{key}>"),
        }
    }
}

/// A compiled pattern that only matches at the start of the text. The match
/// does not have to reach the end.
///
/// The pattern is compiled as written and a match counts only when it starts
/// at offset 0. Leftmost-first search returns such a match whenever one
/// exists.
#[derive(Debug, Clone)]
pub(crate) struct AnchoredRegex(Regex);

impl AnchoredRegex {
    pub(crate) fn new(pattern: &str) -> RunnerResult<Self> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|source| RunnerError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.0.find(text).is_some_and(|m| m.start() == 0)
    }

    pub(crate) fn captures(&self, text: &str) -> Option<Captures> {
        let caps = self.0.captures(text)?;
        if caps.get(0)?.start() != 0 {
            return None;
        }
        Some(Captures::from_match(&self.0, &caps))
    }
}

/// Groups captured from an action line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Captures {
    positional: Vec<Option<String>>,
    named: HashMap<String, String>,
}

impl Captures {
    fn from_match(regex: &Regex, caps: &regex::Captures<'_>) -> Self {
        let positional = caps
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        Self { positional, named }
    }

    /// Captures made of named values only, for invoking an action directly.
    pub fn from_named<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            positional: Vec::new(),
            named: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Every group in pattern order, `None` for groups that did not take part.
    pub fn positional(&self) -> &[Option<String>] {
        &self.positional
    }

    /// Named groups that took part in the match.
    pub fn named(&self) -> &HashMap<String, String> {
        &self.named
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    pub fn group(&self, index: usize) -> Option<&str> {
        self.positional.get(index)?.as_deref()
    }

    /// The named group `name`, or the first positional group for patterns
    /// that do not name their groups.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| self.group(0))
    }
}

/// A unit of test behavior bound to the lines its pattern recognizes.
///
/// Actions are identified by [`Action::name`], which must be unique within a
/// registry.
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn pattern(&self) -> ActionPattern;

    /// Run the action. Failed checks are reported as
    /// [`RunnerError::ActionFailed`].
    fn execute(&self, context: &mut ExecutionContext, captures: &Captures) -> RunnerResult<()>;

    /// Shared bases that only exist to be built upon are never registered.
    fn is_abstract(&self) -> bool {
        false
    }

    fn can_resolve(&self, text: &str) -> bool {
        self.pattern().can_resolve(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::CatalogGetter;

    #[test]
    fn test_can_resolve_is_left_anchored() {
        let pattern = ActionPattern::literal(r#"I go to "(.*)""#);
        assert!(pattern.can_resolve(r#"I go to "home""#));
        assert!(pattern.can_resolve(r#"I go to "home" and stay there"#));
        assert!(!pattern.can_resolve(r#"Then I go to "home""#));
    }

    #[test]
    fn test_can_resolve_invalid_or_localized() {
        assert!(!ActionPattern::literal("I go (").can_resolve("I go ("));
        assert!(!ActionPattern::language_item("page_go_to_regex").can_resolve("page_go_to_regex"));
    }

    #[test]
    fn test_resolves_with_getter() {
        let getter = CatalogGetter::new("en-us").with_entry("greet", "^Hello (?P<who>\\w+)$");
        let pattern = ActionPattern::language_item("greet");
        assert!(pattern.resolves_with(&getter, "Hello world").unwrap());
        assert!(!pattern.resolves_with(&getter, "Bye world").unwrap());

        let unknown = ActionPattern::language_item("farewell");
        assert!(matches!(
            unknown.resolves_with(&getter, "Bye"),
            Err(RunnerError::LanguageDoesNotResolve { language, key })
                if language == "en-us" && key == "farewell"
        ));
    }

    #[test]
    fn test_extended_pattern_with_trailing_comment() {
        let pattern = ActionPattern::literal(r#"(?x) I \s go \s to # navigation"#);
        assert!(pattern.can_resolve("I go to \"home\""));
        assert!(!pattern.can_resolve("Then I go to \"home\""));
    }

    #[test]
    fn test_match_must_start_at_beginning() {
        let regex = AnchoredRegex::new("b+").unwrap();
        assert!(regex.is_match("bba"));
        assert!(!regex.is_match("abb"));
        assert!(regex.captures("abb").is_none());
        assert_eq!(regex.captures("bba").unwrap().positional(), &[] as &[Option<String>]);
    }

    #[test]
    fn test_captures_positional_and_named() {
        let regex = AnchoredRegex::new(r#"(And )?I click "(?P<name>[^"]+)""#).unwrap();
        let captures = regex.captures(r#"I click "Save""#).unwrap();

        assert_eq!(captures.positional(), &[None, Some("Save".to_string())]);
        assert_eq!(captures.get("name"), Some("Save"));
        assert_eq!(captures.group(0), None);
        assert_eq!(captures.group(1), Some("Save"));
        assert_eq!(captures.argument("name"), Some("Save"));
    }

    #[test]
    fn test_argument_falls_back_to_first_group() {
        let regex = AnchoredRegex::new(r#"I go to "(.*)""#).unwrap();
        let captures = regex.captures(r#"I go to "some_url""#).unwrap();
        assert!(captures.named().is_empty());
        assert_eq!(captures.argument("url"), Some("some_url"));
    }

    #[test]
    fn test_pattern_display_and_emptiness() {
        assert_eq!(ActionPattern::language_item("key").to_string(), "<key>");
        assert!(ActionPattern::literal("  ").is_empty());
        assert!(!ActionPattern::literal("^x").is_empty());
    }
}
