//! Scenario execution, setup/teardown ordering and result reporting

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::E2eConfig;
use crate::driver::PlaywrightDriver;
use crate::error::{E2eError, E2eResult};
use crate::fixtures::Fixtures;
use crate::scenarios::{all_scenarios, select, Scenario, ScenarioFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// The scenario could not run as configured, e.g. credentials unset
    ConfigError,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub teardown_error: Option<String>,
}

impl TestResult {
    fn from_errors(
        scenario: &dyn Scenario,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        error: Option<E2eError>,
        teardown_error: Option<E2eError>,
    ) -> Self {
        let outcome = match (&error, &teardown_error) {
            (Some(e), _) if e.is_config_error() => Outcome::ConfigError,
            (None, None) => Outcome::Passed,
            _ => Outcome::Failed,
        };
        Self {
            suite: scenario.suite().to_string(),
            name: scenario.name().to_string(),
            outcome,
            started_at,
            duration_ms,
            error: error.map(|e| e.to_string()),
            teardown_error: teardown_error.map(|e| e.to_string()),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub config_errors: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            config_errors: count(Outcome::ConfigError),
            duration_ms,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.passed == self.total
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: Arc<E2eConfig>,
}

impl TestRunner {
    pub fn with_config(config: E2eConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Check that Playwright is installed and the target app answers
    pub async fn preflight(&self) -> E2eResult<()> {
        let version = PlaywrightDriver::check_playwright_installed().await?;
        info!("Using Playwright {}", version);

        let base_url = &self.config.target.base_url;
        let client = reqwest::Client::builder()
            .timeout(self.config.timeouts.navigation())
            .build()?;
        let response = client.get(base_url).send().await?;
        debug!("{} answered {}", base_url, response.status());
        Ok(())
    }

    /// Run every registered scenario
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        Ok(self.run_scenarios(all_scenarios()).await)
    }

    /// Run the scenarios of one suite, e.g. `login`
    pub async fn run_suite(&self, suite: &str) -> E2eResult<TestSuiteResult> {
        let selected = select(all_scenarios(), |s| s.suite() == suite);
        if selected.is_empty() {
            return Err(E2eError::InvalidConfig(format!("No such suite: {}", suite)));
        }
        Ok(self.run_scenarios(selected).await)
    }

    /// Run a specific test by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let factory = select(all_scenarios(), |s| s.name() == name)
            .into_iter()
            .next()
            .ok_or_else(|| E2eError::InvalidConfig(format!("Test not found: {}", name)))?;

        let result = run_one(self.config.clone(), factory).await;
        log_result(&result);
        Ok(result)
    }

    /// Run `factories`, at most `workers` at a time, each in its own browser
    /// session. Results come back in the order given.
    pub async fn run_scenarios(&self, factories: Vec<ScenarioFactory>) -> TestSuiteResult {
        let start = Instant::now();
        info!(
            "Running {} test(s) with {} worker(s)...",
            factories.len(),
            self.config.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let handles: Vec<_> = factories
            .into_iter()
            .map(|factory| {
                let semaphore = semaphore.clone();
                let config = self.config.clone();
                let names = {
                    let scenario = factory();
                    (scenario.suite(), scenario.name())
                };
                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    run_one(config, factory).await
                });
                (names, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for ((suite, name), handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => TestResult {
                    suite: suite.to_string(),
                    name: name.to_string(),
                    outcome: Outcome::Failed,
                    started_at: Utc::now(),
                    duration_ms: 0,
                    error: Some(format!("Test task aborted: {}", e)),
                    teardown_error: None,
                },
            };
            log_result(&result);
            results.push(result);
        }

        let summary = TestSuiteResult::from_results(results, start.elapsed().as_millis() as u64);

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} config errors ({} ms)",
            summary.passed, summary.failed, summary.config_errors, summary.duration_ms
        );
        summary
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn log_result(result: &TestResult) {
    match result.outcome {
        Outcome::Passed => info!("✓ {} › {} ({} ms)", result.suite, result.name, result.duration_ms),
        Outcome::Failed | Outcome::ConfigError => error!(
            "✗ {} › {} - {}",
            result.suite,
            result.name,
            result.error.as_deref().unwrap_or("teardown failed")
        ),
    }
    if let Some(teardown_error) = &result.teardown_error {
        warn!("  teardown of '{}' failed: {}", result.name, teardown_error);
    }
}

async fn run_one(config: Arc<E2eConfig>, factory: ScenarioFactory) -> TestResult {
    let mut scenario = factory();
    let started_at = Utc::now();
    let start = Instant::now();
    debug!("Running test: {}", scenario.name());

    let (error, teardown_error) = match Fixtures::launch(config).await {
        Ok(fixtures) => execute(scenario.as_mut(), fixtures).await,
        Err(e) => (Some(e), None),
    };

    TestResult::from_errors(
        scenario.as_ref(),
        started_at,
        start.elapsed().as_millis() as u64,
        error,
        teardown_error,
    )
}

/// Bootstrap, run, then always tear down and close the session. Returns the
/// run error and the teardown error separately.
pub(crate) async fn execute(
    scenario: &mut dyn Scenario,
    mut fixtures: Fixtures,
) -> (Option<E2eError>, Option<E2eError>) {
    let setup = if scenario.needs_board() {
        fixtures.bootstrap_board().await
    } else {
        Ok(())
    };
    let run = match setup {
        Ok(()) => scenario.run(&mut fixtures).await,
        Err(e) => Err(e),
    };
    let teardown = scenario.teardown(&mut fixtures).await;

    if let Err(e) = fixtures.close().await {
        warn!("Failed to close browser session: {}", e);
    }
    (run.err(), teardown.err())
}
