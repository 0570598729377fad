use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// How often hosts re-check a condition while waiting on the page.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised by a browser host primitive.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element {selector} not found")]
    ElementNotFound { selector: String },

    #[error("Element {selector} is not visible")]
    ElementNotVisible { selector: String },

    #[error("Element {selector} is not interactable: {reason}")]
    ElementNotInteractable { selector: String, reason: String },

    #[error("Element {selector} is detached from the document")]
    ElementDetached { selector: String },

    #[error("Option not found: {value}")]
    OptionNotFound { value: String },

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Timeout after {elapsed:?}: {operation}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    #[error("Connection lost")]
    ConnectionLost,

    #[error("Not ready")]
    NotReady,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other: {0}")]
    Other(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::Serialization(err.to_string())
    }
}

impl HostError {
    /// Stable code for log lines and reports.
    pub fn code(&self) -> &'static str {
        match self {
            HostError::Navigation(_) => "NAVIGATION_ERROR",
            HostError::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            HostError::ElementNotVisible { .. } => "ELEMENT_NOT_VISIBLE",
            HostError::ElementNotInteractable { .. } => "ELEMENT_NOT_INTERACTABLE",
            HostError::ElementDetached { .. } => "ELEMENT_DETACHED",
            HostError::OptionNotFound { .. } => "OPTION_NOT_FOUND",
            HostError::SelectorInvalid { .. } => "SELECTOR_INVALID",
            HostError::ScriptError(_) => "SCRIPT_ERROR",
            HostError::Timeout { .. } => "TIMEOUT",
            HostError::ConnectionLost => "CONNECTION_LOST",
            HostError::NotReady => "NOT_READY",
            HostError::Serialization(_) => "SERIALIZATION_ERROR",
            HostError::Other(_) => "INTERNAL_ERROR",
            HostError::NotSupported(_) => "NOT_SUPPORTED",
        }
    }

    /// Maps an error code reported by the injected DOM script.
    pub fn from_dom_code(code: &str, selector: &str, message: &str) -> Self {
        let selector = selector.to_string();
        match code {
            "ELEMENT_NOT_FOUND" => HostError::ElementNotFound { selector },
            "ELEMENT_NOT_VISIBLE" => HostError::ElementNotVisible { selector },
            "ELEMENT_NOT_INTERACTABLE" => HostError::ElementNotInteractable {
                selector,
                reason: message.to_string(),
            },
            "OPTION_NOT_FOUND" => HostError::OptionNotFound {
                value: message.to_string(),
            },
            "SELECTOR_INVALID" => HostError::SelectorInvalid { selector },
            _ => HostError::ScriptError(format!("[{}] {}", code, message)),
        }
    }
}

/// How a selector string is interpreted by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Css,
    XPath,
}

impl SelectorKind {
    pub fn of(selector: &str) -> Self {
        let trimmed = selector.trim_start();
        if trimmed.starts_with('/') || trimmed.starts_with('(') {
            SelectorKind::XPath
        } else {
            SelectorKind::Css
        }
    }
}

/// Re-run `probe` until it answers `true` or `timeout` elapses.
///
/// A detached element reads as "not yet"; any other error ends the wait.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    operation: &str,
    mut probe: F,
) -> Result<(), HostError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, HostError>>,
{
    let started = Instant::now();
    loop {
        match probe().await {
            Ok(true) => return Ok(()),
            Ok(false) | Err(HostError::ElementDetached { .. }) => {}
            Err(e) => return Err(e),
        }
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            return Err(HostError::Timeout {
                operation: operation.to_string(),
                elapsed,
            });
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout - elapsed)).await;
    }
}

/// The capability set every browser host must provide.
///
/// Hosts take `&self` so one browser context can be shared by every page
/// object of a scenario.
#[async_trait]
pub trait Host: Send + Sync {
    /// Launch the host (start browser, open a WebDriver session, etc.)
    async fn launch(&mut self) -> Result<(), HostError>;

    /// Close the host and cleanup resources.
    async fn close(&mut self) -> Result<(), HostError>;

    /// Check if the host is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Load `url` and wait for the page to settle, bounded by `timeout`.
    async fn goto_url(&self, url: &str, timeout: Duration) -> Result<(), HostError>;

    /// Wait until `selector` resolves to a visible element.
    async fn wait_for_selector_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), HostError>;

    /// Click an element. `force` skips actionability checks.
    async fn click_selector(&self, selector: &str, force: bool) -> Result<(), HostError>;

    /// Replace the value of an input. `force` skips actionability checks.
    async fn fill_selector(&self, selector: &str, value: &str, force: bool)
    -> Result<(), HostError>;

    /// Text content of the first match; `None` when the DOM reports null.
    async fn read_text_content(&self, selector: &str) -> Result<Option<String>, HostError>;

    /// Whether the first match is currently visible.
    async fn query_visibility(&self, selector: &str) -> Result<bool, HostError>;

    /// Text content of every match, in document order.
    async fn read_all_text_contents(&self, selector: &str) -> Result<Vec<String>, HostError>;

    /// Select an `<option>` of a `<select>` element by value.
    async fn select_option(&self, selector: &str, value: &str) -> Result<(), HostError>;

    /// The URL the host is currently showing.
    async fn current_url(&self) -> Result<String, HostError>;

    /// Capture a screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, HostError> {
        Err(HostError::NotSupported("screenshot".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_succeeds_after_retries() {
        let calls = AtomicU32::new(0);
        let result = poll_until(Duration::from_secs(1), "probe", || async {
            Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let err = poll_until(Duration::from_millis(350), "wait for #never", || async {
            Err(HostError::ElementDetached {
                selector: "#never".into(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, HostError::Timeout { ref operation, .. } if operation == "wait for #never"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_stops_on_hard_error() {
        let calls = AtomicU32::new(0);
        let err = poll_until(Duration::from_secs(5), "probe", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(HostError::SelectorInvalid {
                selector: "##".into(),
            })
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "SELECTOR_INVALID");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_selector_kind() {
        assert_eq!(SelectorKind::of("[data-test=\"username\"]"), SelectorKind::Css);
        assert_eq!(SelectorKind::of("#inventory_container"), SelectorKind::Css);
        assert_eq!(
            SelectorKind::of("//div[text()='Sauce Labs Backpack']"),
            SelectorKind::XPath
        );
        assert_eq!(SelectorKind::of("(//button)[1]"), SelectorKind::XPath);
    }

    #[test]
    fn test_from_dom_code() {
        let err = HostError::from_dom_code("ELEMENT_NOT_FOUND", "#missing", "no match");
        assert_eq!(
            err,
            HostError::ElementNotFound {
                selector: "#missing".into()
            }
        );
        assert_eq!(err.code(), "ELEMENT_NOT_FOUND");

        let err = HostError::from_dom_code("ELEMENT_NOT_INTERACTABLE", "#btn", "covered");
        assert!(matches!(err, HostError::ElementNotInteractable { ref reason, .. } if reason == "covered"));

        let err = HostError::from_dom_code("WEIRD", "#x", "boom");
        assert_eq!(err, HostError::ScriptError("[WEIRD] boom".into()));
    }
}
