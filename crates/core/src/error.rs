use thiserror::Error;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Action definition error in {action}: {reason}")]
    Definition { action: String, reason: String },

    #[error("No language getter available for \"{0}\"")]
    UnknownLanguage(String),

    #[error("The language \"{language}\" does not resolve the string \"{key}\"")]
    LanguageDoesNotResolve { language: String, key: String },

    #[error("Invalid action pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("An action can not execute itself for infinite recursion reasons: {0}")]
    RecursiveDispatch(String),

    #[error("Browser driver error: {0}")]
    Driver(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl RunnerError {
    /// Build the failure an action raises when its own check does not hold.
    pub fn action_failed(message: impl Into<String>) -> Self {
        RunnerError::ActionFailed(message.into())
    }

    /// Failures a scenario runner records and reports, as opposed to defects
    /// in the action set or language catalogs that abort the run.
    pub fn is_action_failure(&self) -> bool {
        matches!(self, RunnerError::ActionFailed(_) | RunnerError::Driver(_))
    }
}
