use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartwrightConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for CartwrightConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            interaction: InteractionConfig::default(),
            runner: RunnerConfig::default(),
            browser: BrowserConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl CartwrightConfig {
    /// Apply `BASE_URL` and the CI profile on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var("BASE_URL") {
            if !base_url.trim().is_empty() {
                self.base_url = base_url;
            }
        }
        if std::env::var_os("CI").is_some() {
            self.runner.apply_ci_profile();
        }
    }
}

fn default_base_url() -> String {
    "https://www.saucedemo.com".to_string()
}

/// Retry budgets for the interaction layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub navigation_attempts: u32,
    #[serde(default = "default_navigation_backoff_ms")]
    pub navigation_backoff_ms: u64,
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub wait_attempts: u32,
    #[serde(default = "default_wait_backoff_ms")]
    pub wait_backoff_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            navigation_attempts: default_max_attempts(),
            navigation_backoff_ms: default_navigation_backoff_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            wait_attempts: default_max_attempts(),
            wait_backoff_ms: default_wait_backoff_ms(),
        }
    }
}

fn default_navigation_timeout_ms() -> u64 {
    30000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_navigation_backoff_ms() -> u64 {
    1000
}

fn default_wait_timeout_ms() -> u64 {
    10000
}

fn default_wait_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_scenario_timeout_ms")]
    pub scenario_timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub max_failures: Option<usize>,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Save a screenshot under `report_dir` whenever an attempt fails.
    #[serde(default = "default_screenshot_on_failure")]
    pub screenshot_on_failure: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            scenario_timeout_ms: default_scenario_timeout_ms(),
            retries: default_retries(),
            workers: default_workers(),
            max_failures: None,
            report_dir: default_report_dir(),
            screenshot_on_failure: default_screenshot_on_failure(),
        }
    }
}

impl RunnerConfig {
    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }

    /// Settings used when `CI` is set.
    pub fn apply_ci_profile(&mut self) {
        self.retries = 2;
        self.workers = 4;
        self.max_failures = Some(10);
    }
}

fn default_scenario_timeout_ms() -> u64 {
    30000
}

fn default_retries() -> u32 {
    1
}

fn default_workers() -> usize {
    3
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_screenshot_on_failure() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// Chromium driven over the DevTools protocol.
    Headless,
    /// Any browser behind a WebDriver endpoint.
    Webdriver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_host")]
    pub host: HostKind,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_driver_url")]
    pub driver_url: String,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_browser_args")]
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            headless: default_headless(),
            driver_url: default_driver_url(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            args: default_browser_args(),
        }
    }
}

fn default_host() -> HostKind {
    HostKind::Headless
}

fn default_headless() -> bool {
    true
}

fn default_driver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_browser_args() -> Vec<String> {
    vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,
    #[serde(default = "default_redact_in_logs")]
    pub redact_in_logs: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            sensitive_fields: default_sensitive_fields(),
            redact_in_logs: default_redact_in_logs(),
        }
    }
}

impl SecurityConfig {
    /// Whether a value typed into `selector` should be masked in logs.
    pub fn is_sensitive(&self, selector: &str) -> bool {
        if !self.redact_in_logs {
            return false;
        }
        let selector = selector.to_ascii_lowercase();
        self.sensitive_fields
            .iter()
            .any(|field| selector.contains(&field.to_ascii_lowercase()))
    }
}

fn default_sensitive_fields() -> Vec<String> {
    vec![
        "password".to_string(),
        "token".to_string(),
        "card_number".to_string(),
        "cvv".to_string(),
        "secret".to_string(),
    ]
}

fn default_redact_in_logs() -> bool {
    true
}
