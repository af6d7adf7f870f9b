//! Scenario runner: executes the action lines of a scenario one after the
//! other against a single execution context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use phrase_core::RunnerResult;

use crate::context::ExecutionContext;
use crate::language::LanguageGetter;
use crate::registry::ActionRegistry;

/// A named, ordered list of action lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub lines: Vec<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

/// Split a scenario file into scenarios.
///
/// A line made of the language's scenario header followed by `:` starts a new
/// scenario; the rest of that line is its name. Blank lines and `#` comments
/// are skipped. Lines before the first header form a scenario named
/// `default`.
pub fn parse_scenarios(source: &str, getter: &dyn LanguageGetter) -> Vec<Scenario> {
    let header = getter.get("scenario_header").unwrap_or("Scenario");
    let mut scenarios: Vec<Scenario> = Vec::new();

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line
            .strip_prefix(header)
            .and_then(|rest| rest.trim_start().strip_prefix(':'))
        {
            scenarios.push(Scenario::new(name.trim()));
            continue;
        }

        match scenarios.last_mut() {
            Some(current) => current.lines.push(line.to_string()),
            None => scenarios.push(Scenario::new("default").with_line(line)),
        }
    }

    scenarios
}

/// Outcome of one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Executed,
    Failed { message: String },
    /// No registered action recognizes the line.
    Unrecognized,
    /// Not run because an earlier step did not succeed.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_number: u32,
    pub line: String,
    pub action: Option<String>,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Record of a complete scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub id: Uuid,
    pub scenario: String,
    pub language: String,
    pub state: RunState,
    pub steps: Vec<StepRecord>,
    pub final_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScenarioRun {
    pub fn passed(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn count(&self, outcome: fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| outcome(&s.outcome)).count()
    }
}

/// Runs scenarios through a registry.
pub struct ScenarioRunner<'a> {
    registry: &'a ActionRegistry,
    stop_on_failure: bool,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(registry: &'a ActionRegistry) -> Self {
        Self {
            registry,
            stop_on_failure: true,
        }
    }

    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Execute every line of `scenario`.
    ///
    /// Failed actions and unrecognized lines are recorded and fail the run.
    /// Defects in the action set or language catalogs abort with an error.
    pub fn run(
        &self,
        scenario: &Scenario,
        context: &mut ExecutionContext,
    ) -> RunnerResult<ScenarioRun> {
        let started_at = Utc::now();
        info!(
            scenario = %scenario.name,
            language = context.language(),
            steps = scenario.lines.len(),
            "Starting scenario"
        );

        let mut steps = Vec::with_capacity(scenario.lines.len());
        let mut failed = false;

        for (i, line) in scenario.lines.iter().enumerate() {
            let step_start = Utc::now();

            if failed && self.stop_on_failure {
                steps.push(StepRecord {
                    step_number: (i + 1) as u32,
                    line: line.clone(),
                    action: None,
                    outcome: StepOutcome::Skipped,
                    duration_ms: 0,
                    timestamp: step_start,
                });
                continue;
            }

            let language = context.language().to_string();
            let getter = context.getter_override();
            let (action, outcome) = match self.registry.suitable_for(line, &language, getter.as_deref())? {
                None => {
                    warn!(step = i + 1, line = %line, "No action matches line");
                    (None, StepOutcome::Unrecognized)
                }
                Some(matched) => {
                    let outcome = match self.registry.invoke(&matched, context) {
                        Ok(()) => StepOutcome::Executed,
                        Err(e) if e.is_action_failure() => {
                            warn!(step = i + 1, action = matched.action_name(), error = %e, "Step failed");
                            StepOutcome::Failed {
                                message: e.to_string(),
                            }
                        }
                        Err(e) => return Err(e),
                    };
                    (Some(matched.action_name().to_string()), outcome)
                }
            };

            failed |= outcome != StepOutcome::Executed;
            steps.push(StepRecord {
                step_number: (i + 1) as u32,
                line: line.clone(),
                action,
                outcome,
                duration_ms: (Utc::now() - step_start).num_milliseconds().max(0) as u64,
                timestamp: step_start,
            });
        }

        let completed_at = Utc::now();
        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
        let state = if failed {
            RunState::Failed
        } else {
            RunState::Completed
        };

        info!(
            scenario = %scenario.name,
            state = ?state,
            duration_ms,
            "Scenario finished"
        );

        Ok(ScenarioRun {
            id: Uuid::new_v4(),
            scenario: scenario.name.clone(),
            language: context.language().to_string(),
            state,
            steps,
            final_url: context.url.clone(),
            started_at,
            completed_at,
            duration_ms,
        })
    }
}
