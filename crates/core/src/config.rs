use serde::Deserialize;

/// Runner configuration. Loaded from environment variables with the prefix
/// `PHRASE_RUNNER__`, e.g. `PHRASE_RUNNER__DEFAULT_LANGUAGE=pt-br`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,
    #[serde(default = "default_stop_on_failure")]
    pub stop_on_failure: bool,
}

fn default_language() -> String {
    "en-us".to_string()
}
fn default_page_timeout_ms() -> u64 {
    30_000
}
fn default_stop_on_failure() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            base_url: None,
            page_timeout_ms: default_page_timeout_ms(),
            stop_on_failure: default_stop_on_failure(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("PHRASE_RUNNER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
