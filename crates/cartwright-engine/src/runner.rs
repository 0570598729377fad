//! Suite runner: global setup, isolated scenario workers, retries,
//! teardown, and the run summary.

use crate::api::{ApiError, ApiHelper};
use crate::config::{CartwrightConfig, ConfigError};
use crate::host::{Host, HostError};
use crate::interaction::{Interactor, RetryPolicy};
use crate::pages::Pages;
use crate::scenarios::{Scenario, ScenarioError};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use url::Url;

/// Creates a fresh, not yet launched host for every scenario attempt.
#[async_trait]
pub trait HostFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn Host>, HostError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScenarioOutcome {
    Passed,
    /// Passed, but only after at least one retry.
    Flaky,
    Failed { error: String },
    /// Not run because the failure limit was reached.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub suite: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: ScenarioOutcome,
    pub attempts: u32,
    pub duration_ms: u128,
    /// Screenshots saved when attempts failed, oldest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<ScenarioReport>,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Passed))
    }

    pub fn flaky(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Flaky))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Skipped))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    /// Write the summary as `summary.json` under `dir`.
    pub async fn write_json(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join("summary.json");
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}

struct Shared {
    factory: Arc<dyn HostFactory>,
    policy: RetryPolicy,
    base_url: Url,
    config: CartwrightConfig,
    failures: AtomicUsize,
}

pub struct Runner {
    shared: Arc<Shared>,
}

impl Runner {
    pub fn new(factory: Arc<dyn HostFactory>, config: CartwrightConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            shared: Arc::new(Shared {
                factory,
                policy: RetryPolicy::from(&config.interaction),
                base_url,
                config,
                failures: AtomicUsize::new(0),
            }),
        })
    }

    /// Run `scenarios` on at most `runner.workers` concurrent workers.
    /// Reports come back in the order the scenarios were given.
    pub async fn run(&self, scenarios: Vec<Scenario>) -> RunSummary {
        let workers = self.shared.config.runner.workers.max(1);
        let permits = Arc::new(Semaphore::new(workers));
        info!(
            "Running {} scenarios using {} workers",
            scenarios.len(),
            workers
        );

        let mut tasks = JoinSet::new();
        for (index, scenario) in scenarios.iter().copied().enumerate() {
            let shared = self.shared.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                (index, shared.run_scenario(scenario).await)
            });
        }

        let mut reports: Vec<Option<ScenarioReport>> = vec![None; scenarios.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                Err(e) => error!("Scenario worker panicked: {}", e),
            }
        }

        let reports = reports
            .into_iter()
            .zip(&scenarios)
            .map(|(report, scenario)| {
                report.unwrap_or_else(|| ScenarioReport {
                    suite: scenario.suite.to_string(),
                    name: scenario.name.to_string(),
                    outcome: ScenarioOutcome::Failed {
                        error: "worker panicked".to_string(),
                    },
                    attempts: 0,
                    duration_ms: 0,
                    screenshots: Vec::new(),
                })
            })
            .collect();
        RunSummary { reports }
    }
}

impl Shared {
    fn failure_limit_reached(&self) -> bool {
        match self.config.runner.max_failures {
            Some(limit) => self.failures.load(Ordering::SeqCst) >= limit,
            None => false,
        }
    }

    async fn run_scenario(&self, scenario: Scenario) -> ScenarioReport {
        let started = Instant::now();
        let mut screenshots = Vec::new();
        let report = |outcome, attempts, screenshots| ScenarioReport {
            suite: scenario.suite.to_string(),
            name: scenario.name.to_string(),
            outcome,
            attempts,
            duration_ms: started.elapsed().as_millis(),
            screenshots,
        };

        if self.failure_limit_reached() {
            warn!("Skipping {}: failure limit reached", scenario.title());
            return report(ScenarioOutcome::Skipped, 0, screenshots);
        }

        let max_attempts = self.config.runner.retries + 1;
        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            info!("Running {} (Attempt {}/{})", scenario.title(), attempt, max_attempts);
            let (result, screenshot) = self.run_attempt(scenario, attempt).await;
            screenshots.extend(screenshot);
            match result {
                Ok(()) => {
                    info!("✓ {}", scenario.title());
                    let outcome = if attempt == 1 {
                        ScenarioOutcome::Passed
                    } else {
                        ScenarioOutcome::Flaky
                    };
                    return report(outcome, attempt, screenshots);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        warn!("{} failed, retrying: {}", scenario.title(), e);
                    } else {
                        error!("✗ {}: {}", scenario.title(), e);
                    }
                }
            }
        }

        self.failures.fetch_add(1, Ordering::SeqCst);
        report(
            ScenarioOutcome::Failed { error: last_error },
            max_attempts,
            screenshots,
        )
    }

    /// One attempt in its own browser context. A failed attempt is
    /// screenshotted before the host is closed, and the host is closed
    /// whatever the scenario's result.
    async fn run_attempt(
        &self,
        scenario: Scenario,
        attempt: u32,
    ) -> (Result<(), ScenarioError>, Option<PathBuf>) {
        let mut host = match self.factory.create().await {
            Ok(host) => host,
            Err(e) => return (Err(e.into()), None),
        };
        if let Err(e) = host.launch().await {
            if let Err(close_err) = host.close().await {
                warn!("Failed to close browser host after launch error: {}", close_err);
            }
            return (Err(e.into()), None);
        }
        let mut host: Arc<dyn Host> = Arc::from(host);

        let result = {
            let ui = Interactor::new(host.clone())
                .with_policy(self.policy.clone())
                .with_base_url(self.base_url.clone())
                .with_security(self.config.security.clone());
            let pages = Pages::new(ui);
            let timeout = self.config.runner.scenario_timeout();
            match tokio::time::timeout(timeout, (scenario.run)(&pages)).await {
                Ok(result) => result,
                Err(_) => Err(ScenarioError::Timeout(timeout)),
            }
        };

        let screenshot = if result.is_err() && self.config.runner.screenshot_on_failure {
            self.capture_failure(host.as_ref(), scenario, attempt).await
        } else {
            None
        };

        match Arc::get_mut(&mut host) {
            Some(host) => {
                if let Err(e) = host.close().await {
                    warn!("Failed to close browser host: {}", e);
                }
            }
            None => warn!("Browser host still shared after scenario, not closing"),
        }
        (result, screenshot)
    }

    /// Save the page as `<report_dir>/<suite>-<name>-attempt<N>.png`.
    /// Returns `None` when the host cannot take screenshots or the file
    /// cannot be written.
    async fn capture_failure(
        &self,
        host: &dyn Host,
        scenario: Scenario,
        attempt: u32,
    ) -> Option<PathBuf> {
        let bytes = match host.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("No screenshot for {}: {}", scenario.title(), e);
                return None;
            }
        };

        let dir = &self.config.runner.report_dir;
        let path = dir.join(screenshot_file_name(scenario, attempt));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, bytes).await
        };
        match written.await {
            Ok(()) => {
                info!("Saved failure screenshot to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to save screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// File name for a failed attempt's screenshot, e.g.
/// `login-locked-out-user-attempt1.png`.
pub fn screenshot_file_name(scenario: Scenario, attempt: u32) -> String {
    format!(
        "{}-{}-attempt{}.png",
        slug(scenario.suite),
        slug(scenario.name),
        attempt
    )
}

fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Check the storefront API answers before any scenario runs.
pub async fn global_setup(api: &ApiHelper) -> Result<(), ApiError> {
    match api.login_default().await {
        Ok(response) => {
            info!("✓ API endpoints are accessible (status {})", response.status);
            Ok(())
        }
        Err(e) => {
            error!("✗ API endpoints are not accessible: {}", e);
            Err(e)
        }
    }
}

/// Clear test data after the run. Failures are logged, never returned.
pub async fn global_teardown(api: &ApiHelper) {
    match api.clear_cart().await {
        Ok(_) => info!("✓ Test data cleaned up"),
        Err(e) => error!("✗ Failed to clean up test data: {}", e),
    }
}

/// Render a one-line-per-scenario summary for the terminal.
pub fn format_summary(summary: &RunSummary, elapsed: Duration) -> String {
    let mut lines = Vec::new();
    for report in &summary.reports {
        let mark = match &report.outcome {
            ScenarioOutcome::Passed => "✓".to_string(),
            ScenarioOutcome::Flaky => "±".to_string(),
            ScenarioOutcome::Failed { .. } => "✗".to_string(),
            ScenarioOutcome::Skipped => "-".to_string(),
        };
        lines.push(format!(
            "  {} {} › {} ({}ms)",
            mark, report.suite, report.name, report.duration_ms
        ));
        if let ScenarioOutcome::Failed { error } = &report.outcome {
            lines.push(format!("      {}", error));
        }
        for screenshot in &report.screenshots {
            lines.push(format!("      screenshot: {}", screenshot.display()));
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "  {} passed, {} flaky, {} failed, {} skipped ({:.1}s)",
        summary.passed(),
        summary.flaky(),
        summary.failed(),
        summary.skipped(),
        elapsed.as_secs_f64()
    ));
    lines.join("\n")
}
