//! phrase-runner: runs natural-language browser test scenarios.
//!
//! Scenarios are resolved and executed against a recording driver, so a run
//! checks that every line is recognized and every action succeeds without
//! touching a browser.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use phrase_actions::{
    getter_for, parse_scenarios, ActionRegistry, ExecutionContext, Page, PageRegistry,
    RecordingDriver, ScenarioRunner, Settings, StepOutcome,
};
use phrase_core::config::RunnerConfig;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "phrase-runner")]
#[command(about = "Run natural-language browser test scenarios")]
#[command(version)]
struct Cli {
    /// Scenario file to run
    file: PathBuf,

    /// Language of the scenario file (overrides config)
    #[arg(long, env = "PHRASE_RUNNER__DEFAULT_LANGUAGE")]
    language: Option<String>,

    /// Base URL relative addresses are joined to (overrides config)
    #[arg(long, env = "PHRASE_RUNNER__BASE_URL")]
    base_url: Option<String>,

    /// Register a page as `Name=url`; may be repeated
    #[arg(long = "page", value_parser = parse_page)]
    pages: Vec<Page>,

    /// Keep running a scenario after a failed step
    #[arg(long, default_value_t = false)]
    keep_going: bool,

    /// Print each run as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn parse_page(arg: &str) -> Result<Page, String> {
    match arg.split_once('=') {
        Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
            Ok(Page::new(name.trim(), url.trim()))
        }
        _ => Err(format!("expected Name=url, got {arg:?}")),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "phrase_runner=info,phrase_actions=info".into());
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut config = RunnerConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RunnerConfig::default()
    });

    if let Some(language) = cli.language {
        config.default_language = language;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url);
    }
    if cli.keep_going {
        config.stop_on_failure = false;
    }

    info!(
        language = %config.default_language,
        base_url = ?config.base_url,
        stop_on_failure = config.stop_on_failure,
        "Configuration loaded"
    );

    let source = std::fs::read_to_string(&cli.file)?;
    let getter = getter_for(&config.default_language)?;
    let scenarios = parse_scenarios(&source, getter);
    let registry = ActionRegistry::global()?;
    let runner = ScenarioRunner::new(registry).stop_on_failure(config.stop_on_failure);
    let pages = Arc::new(cli.pages.into_iter().fold(PageRegistry::new(), PageRegistry::with_page));

    let mut failed = 0usize;
    for scenario in &scenarios {
        let mut context = ExecutionContext::new(
            config.default_language.clone(),
            Box::new(RecordingDriver::new()),
        )
        .with_settings(Settings::from_config(&config))
        .with_pages(Arc::clone(&pages));

        let run = runner.run(scenario, &mut context)?;
        if !run.passed() {
            failed += 1;
        }

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&run)?);
            continue;
        }

        println!("{} [{:?}]", run.scenario, run.state);
        for step in &run.steps {
            let status = match &step.outcome {
                StepOutcome::Executed => "ok".to_string(),
                StepOutcome::Failed { message } => format!("failed: {message}"),
                StepOutcome::Unrecognized => "unrecognized".to_string(),
                StepOutcome::Skipped => "skipped".to_string(),
            };
            println!("  {:>3}. {} ... {status}", step.step_number, step.line);
        }
    }

    info!(
        scenarios = scenarios.len(),
        failed,
        "Finished running scenarios"
    );

    if failed > 0 {
        anyhow::bail!("{failed} of {} scenarios failed", scenarios.len());
    }
    Ok(())
}
