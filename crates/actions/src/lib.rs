//! Action resolution for natural-language browser test scripts.
//!
//! Each line of a scenario is matched against a registry of actions, whose
//! patterns may be localized per language, and the matching action runs
//! against a shared execution context.
//!
//! # Modules
//! - `action`: Action patterns, captured groups and the `Action` trait
//! - `registry`: Ordered action registry and line dispatch
//! - `language`: Per-language catalogs resolving pattern keys
//! - `context`: Execution context and the browser driver capability
//! - `page_objects`: Named pages and their elements
//! - `page_actions`: Built-in navigation and page checks
//! - `element_actions`: Built-in element interactions
//! - `scenario`: Scenario parsing and the step-by-step runner

pub mod action;
pub mod context;
pub mod element_actions;
pub mod language;
pub mod page_actions;
pub mod page_objects;
pub mod registry;
pub mod scenario;

pub use action::{Action, ActionPattern, Captures};
pub use context::{BrowserDriver, DriverCall, ExecutionContext, RecordingDriver, Settings};
pub use language::{available_getters, getter_for, CatalogGetter, LanguageGetter};
pub use page_objects::{ElementType, Page, PageElement, PageRegistry};
pub use registry::{ActionRegistry, MatchResult};
pub use scenario::{parse_scenarios, RunState, Scenario, ScenarioRun, ScenarioRunner, StepOutcome};
