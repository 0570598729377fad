//! Resilient page interaction.
//!
//! Wraps the raw [`Host`] primitives with bounded retries and linear
//! backoff. Three recovery shapes are used:
//!
//! * navigation and visibility waits are retried as a whole, sleeping
//!   `step × attempt` between attempts;
//! * click and fill fall back to the forced variant exactly once;
//! * visibility probes never fail and report `false` instead.

use crate::config::{CartwrightConfig, ConfigError, InteractionConfig, SecurityConfig};
use crate::host::{Host, HostError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// The primitive an attempt is performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Navigate,
    Click,
    Fill,
    WaitForVisible,
    GetText,
    IsVisible,
    AllTexts,
    SelectOption,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Navigate => "navigate",
            Operation::Click => "click",
            Operation::Fill => "fill",
            Operation::WaitForVisible => "waitForVisible",
            Operation::GetText => "getText",
            Operation::IsVisible => "isVisible",
            Operation::AllTexts => "allTexts",
            Operation::SelectOption => "selectOption",
        };
        f.write_str(name)
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    TransientFailure,
    TerminalFailure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Success => "success",
            Outcome::TransientFailure => "transient-failure",
            Outcome::TerminalFailure => "terminal-failure",
        };
        f.write_str(name)
    }
}

/// One attempt of one call. Lives only as long as the call and is surfaced
/// through log fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt<'a> {
    pub operation: Operation,
    pub target: &'a str,
    pub number: u32,
    pub max: u32,
}

impl Attempt<'_> {
    /// Outcome of this attempt given whether the primitive succeeded.
    pub fn outcome(&self, succeeded: bool) -> Outcome {
        if succeeded {
            Outcome::Success
        } else if self.number < self.max {
            Outcome::TransientFailure
        } else {
            Outcome::TerminalFailure
        }
    }
}

/// Bounded attempt budget with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub step: Duration,
}

impl Backoff {
    pub const fn new(max_attempts: u32, step: Duration) -> Self {
        Self { max_attempts, step }
    }

    /// Delay slept before attempt `attempt` (1-based). Zero for the first.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.step * attempt.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub navigation: Backoff,
    pub navigation_timeout: Duration,
    pub wait: Backoff,
    pub wait_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&InteractionConfig::default())
    }
}

impl From<&InteractionConfig> for RetryPolicy {
    fn from(config: &InteractionConfig) -> Self {
        Self {
            navigation: Backoff::new(
                config.navigation_attempts.max(1),
                Duration::from_millis(config.navigation_backoff_ms),
            ),
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            wait: Backoff::new(
                config.wait_attempts.max(1),
                Duration::from_millis(config.wait_backoff_ms),
            ),
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InteractionError {
    #[error("Failed to navigate to {url} after {attempts} attempts: {source}")]
    Navigation {
        url: String,
        attempts: u32,
        source: HostError,
    },

    #[error("Element {selector} not found after {attempts} attempts: {source}")]
    ElementNotFound {
        selector: String,
        attempts: u32,
        source: HostError,
    },

    #[error("{operation} on {selector} failed{}: {source}", forced_suffix(.forced))]
    Action {
        operation: Operation,
        selector: String,
        forced: bool,
        source: HostError,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl InteractionError {
    /// The host failure behind this error.
    pub fn host_error(&self) -> &HostError {
        match self {
            InteractionError::Navigation { source, .. }
            | InteractionError::ElementNotFound { source, .. }
            | InteractionError::Action { source, .. } => source,
            InteractionError::Host(source) => source,
        }
    }
}

fn forced_suffix(forced: &bool) -> &'static str {
    if *forced { " after forced retry" } else { "" }
}

/// Collapses any probe failure to "not visible".
fn collapse_to_hidden(selector: &str, probe: Result<bool, HostError>) -> bool {
    match probe {
        Ok(visible) => visible,
        Err(err) => {
            debug!(
                selector,
                code = err.code(),
                "Visibility probe failed, treating as hidden: {}",
                err
            );
            false
        }
    }
}

/// The retrying interaction layer every page object builds on.
#[derive(Clone)]
pub struct Interactor {
    host: Arc<dyn Host>,
    policy: RetryPolicy,
    base_url: Option<Url>,
    security: SecurityConfig,
}

impl Interactor {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            policy: RetryPolicy::default(),
            base_url: None,
            security: SecurityConfig::default(),
        }
    }

    pub fn from_config(host: Arc<dyn Host>, config: &CartwrightConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            host,
            policy: RetryPolicy::from(&config.interaction),
            base_url: Some(base_url),
            security: config.security.clone(),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Absolute URLs pass through; anything else is joined onto the base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if Url::parse(url).is_ok() {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => base
                .join(url)
                .map(String::from)
                .unwrap_or_else(|_| url.to_string()),
            None => url.to_string(),
        }
    }

    /// Load `url`, retrying with linear backoff.
    pub async fn navigate(&self, url: &str) -> Result<(), InteractionError> {
        let resolved = self.resolve_url(url);
        let timeout = self.policy.navigation_timeout;
        let host = &self.host;
        let target = resolved.as_str();

        self.retry(Operation::Navigate, target, self.policy.navigation, || async move {
            bounded(
                timeout,
                format!("navigate to {}", target),
                host.goto_url(target, timeout),
            )
            .await
        })
        .await
        .map_err(|(attempts, source)| InteractionError::Navigation {
            url: resolved.clone(),
            attempts,
            source,
        })
    }

    /// Wait for `selector` to become visible using the default timeout.
    pub async fn wait_for_visible(&self, selector: &str) -> Result<(), InteractionError> {
        self.wait_for_visible_within(selector, self.policy.wait_timeout)
            .await
    }

    /// Wait for `selector` to become visible, retrying the whole wait.
    pub async fn wait_for_visible_within(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), InteractionError> {
        let host = &self.host;

        self.retry(Operation::WaitForVisible, selector, self.policy.wait, || async move {
            bounded(
                timeout,
                format!("wait for {}", selector),
                host.wait_for_selector_visible(selector, timeout),
            )
            .await
        })
        .await
        .map_err(|(attempts, source)| InteractionError::ElementNotFound {
            selector: selector.to_string(),
            attempts,
            source,
        })
    }

    pub async fn click(&self, selector: &str) -> Result<(), InteractionError> {
        self.wait_for_visible(selector).await?;
        debug!("Clicking element: {}", selector);
        self.with_force_fallback(Operation::Click, selector, |force| {
            self.host.click_selector(selector, force)
        })
        .await
    }

    pub async fn fill(&self, selector: &str, value: &str) -> Result<(), InteractionError> {
        self.wait_for_visible(selector).await?;
        if self.security.is_sensitive(selector) {
            debug!("Filling {} with value: [REDACTED]", selector);
        } else {
            debug!("Filling {} with value: {}", selector, value);
        }
        self.with_force_fallback(Operation::Fill, selector, |force| {
            self.host.fill_selector(selector, value, force)
        })
        .await
    }

    /// Text content of `selector`; empty when the element has none.
    pub async fn get_text(&self, selector: &str) -> Result<String, InteractionError> {
        self.wait_for_visible(selector).await?;
        debug!("Getting text from element: {}", selector);
        let text = self
            .host
            .read_text_content(selector)
            .await
            .map_err(|source| action_error(Operation::GetText, selector, false, source))?;
        Ok(text.unwrap_or_default())
    }

    /// Never fails: any host error reads as not visible.
    pub async fn is_visible(&self, selector: &str) -> bool {
        debug!("Checking visibility of element: {}", selector);
        collapse_to_hidden(selector, self.host.query_visibility(selector).await)
    }

    /// One bounded wait for `selector`, without retries. Any failure,
    /// timeout included, reads as "did not appear".
    pub async fn appears_within(&self, selector: &str, timeout: Duration) -> bool {
        debug!("Waiting up to {:?} for element: {}", timeout, selector);
        let waited = bounded(
            timeout,
            format!("wait for {}", selector),
            self.host.wait_for_selector_visible(selector, timeout),
        )
        .await;
        collapse_to_hidden(selector, waited.map(|()| true))
    }

    /// Text content of every match once the first one is visible.
    pub async fn all_texts(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, InteractionError> {
        self.wait_for_visible_within(selector, timeout).await?;
        debug!("Getting all texts from elements: {}", selector);
        self.host
            .read_all_text_contents(selector)
            .await
            .map_err(|source| action_error(Operation::AllTexts, selector, false, source))
    }

    pub async fn select_option(&self, selector: &str, value: &str) -> Result<(), InteractionError> {
        self.wait_for_visible(selector).await?;
        debug!("Selecting option {} in {}", value, selector);
        self.host
            .select_option(selector, value)
            .await
            .map_err(|source| action_error(Operation::SelectOption, selector, false, source))
    }

    pub async fn current_url(&self) -> Result<String, InteractionError> {
        Ok(self.host.current_url().await?)
    }

    /// Runs `action` plainly, then once more forced. Nothing after that.
    async fn with_force_fallback<F, Fut>(
        &self,
        operation: Operation,
        selector: &str,
        action: F,
    ) -> Result<(), InteractionError>
    where
        F: Fn(bool) -> Fut,
        Fut: Future<Output = Result<(), HostError>>,
    {
        match action(false).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    code = err.code(),
                    "{} failed, retrying with force: {} ({})", operation, selector, err
                );
                action(true).await.map_err(|source| {
                    error!(
                        code = source.code(),
                        "Forced {} failed on {}: {}", operation, selector, source
                    );
                    action_error(operation, selector, true, source)
                })
            }
        }
    }

    /// Runs `action` until it succeeds or `budget` is spent. On exhaustion
    /// returns the attempt count with the last host error.
    async fn retry<T, F, Fut>(
        &self,
        operation: Operation,
        target: &str,
        budget: Backoff,
        mut action: F,
    ) -> Result<T, (u32, HostError)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HostError>>,
    {
        let max = budget.max_attempts.max(1);
        let mut number = 1;
        loop {
            let attempt = Attempt {
                operation,
                target,
                number,
                max,
            };
            log_attempt_start(&attempt);

            match action().await {
                Ok(value) => return Ok(value),
                Err(err) => match attempt.outcome(false) {
                    Outcome::TransientFailure => {
                        warn!(
                            operation = %operation,
                            outcome = %Outcome::TransientFailure,
                            code = err.code(),
                            "{} failed on {}, retrying... ({}/{}): {}",
                            operation,
                            target,
                            number,
                            max,
                            err
                        );
                        number += 1;
                        tokio::time::sleep(budget.delay_before(number)).await;
                    }
                    _ => {
                        error!(
                            operation = %operation,
                            outcome = %Outcome::TerminalFailure,
                            code = err.code(),
                            "{} failed on {} after {} attempts: {}",
                            operation,
                            target,
                            max,
                            err
                        );
                        return Err((number, err));
                    }
                },
            }
        }
    }
}

fn log_attempt_start(attempt: &Attempt<'_>) {
    match attempt.operation {
        Operation::Navigate => info!(
            "Navigating to {} (Attempt {}/{})",
            attempt.target, attempt.number, attempt.max
        ),
        _ => debug!(
            "{} {} (Attempt {}/{})",
            attempt.operation, attempt.target, attempt.number, attempt.max
        ),
    }
}

fn action_error(
    operation: Operation,
    selector: &str,
    forced: bool,
    source: HostError,
) -> InteractionError {
    InteractionError::Action {
        operation,
        selector: selector.to_string(),
        forced,
        source,
    }
}

/// Abandons `fut` once `timeout` elapses.
async fn bounded<T>(
    timeout: Duration,
    operation: String,
    fut: impl Future<Output = Result<T, HostError>>,
) -> Result<T, HostError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(HostError::Timeout {
            operation,
            elapsed: timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delays_are_linear() {
        let nav = Backoff::new(3, Duration::from_millis(1000));
        assert_eq!(nav.delay_before(1), Duration::ZERO);
        assert_eq!(nav.delay_before(2), Duration::from_millis(1000));
        assert_eq!(nav.delay_before(3), Duration::from_millis(2000));

        let wait = Backoff::new(3, Duration::from_millis(500));
        assert_eq!(wait.delay_before(2), Duration::from_millis(500));
        assert_eq!(wait.delay_before(3), Duration::from_millis(1000));
    }

    #[test]
    fn test_attempt_outcome() {
        let attempt = |number| Attempt {
            operation: Operation::Navigate,
            target: "/",
            number,
            max: 3,
        };
        assert_eq!(attempt(1).outcome(true), Outcome::Success);
        assert_eq!(attempt(1).outcome(false), Outcome::TransientFailure);
        assert_eq!(attempt(2).outcome(false), Outcome::TransientFailure);
        assert_eq!(attempt(3).outcome(false), Outcome::TerminalFailure);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.navigation.max_attempts, 3);
        assert_eq!(policy.navigation_timeout, Duration::from_secs(30));
        assert_eq!(policy.wait.max_attempts, 3);
        assert_eq!(policy.wait_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_collapse_to_hidden() {
        assert!(collapse_to_hidden("#a", Ok(true)));
        assert!(!collapse_to_hidden("#a", Ok(false)));
        assert!(!collapse_to_hidden(
            "#a",
            Err(HostError::ElementDetached {
                selector: "#a".into()
            })
        ));
    }

    #[test]
    fn test_action_error_message() {
        let err = action_error(
            Operation::Click,
            "#btn",
            true,
            HostError::ElementNotInteractable {
                selector: "#btn".into(),
                reason: "covered".into(),
            },
        );
        assert!(err.to_string().starts_with("click on #btn failed after forced retry"));
    }
}
