use crate::webdriver::{WebDriverClient, WebDriverOptions};
use async_trait::async_trait;
use cartwright_engine::dom::{DomScript, reply_value};
use cartwright_engine::host::{Host, HostError, SelectorKind, poll_until};
use cartwright_engine::runner::HostFactory;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// A browser session behind a WebDriver endpoint.
///
/// Plain clicks and fills go through WebDriver's own element commands, so
/// the driver's actionability checks apply. Forced variants and all reads
/// run as DOM scripts.
pub struct WebDriverHost {
    client: Option<WebDriverClient>,
    options: WebDriverOptions,
}

impl WebDriverHost {
    pub fn new(options: WebDriverOptions) -> Self {
        Self {
            client: None,
            options,
        }
    }

    fn client(&self) -> Result<&Client, HostError> {
        self.client
            .as_ref()
            .map(|c| &c.client)
            .ok_or(HostError::NotReady)
    }

    async fn run(&self, script: DomScript, selector: &str) -> Result<Value, HostError> {
        let raw = self
            .client()?
            .execute(&script.webdriver_source(), script.webdriver_args())
            .await
            .map_err(|e| classify(e, selector))?;
        reply_value(raw, selector)
    }

    async fn find(&self, selector: &str) -> Result<Element, HostError> {
        self.client()?
            .find(locator(selector))
            .await
            .map_err(|e| classify(e, selector))
    }

    async fn document_complete(&self) -> Result<bool, HostError> {
        let state = self.run(DomScript::ready_state(), "document").await?;
        Ok(state.as_str() == Some("complete"))
    }
}

fn locator(selector: &str) -> Locator<'_> {
    match SelectorKind::of(selector) {
        SelectorKind::Css => Locator::Css(selector),
        SelectorKind::XPath => Locator::XPath(selector),
    }
}

/// Map a WebDriver command error onto the host error it stands for.
fn classify(err: CmdError, selector: &str) -> HostError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let selector = selector.to_string();
    if lower.contains("no such element") {
        HostError::ElementNotFound { selector }
    } else if lower.contains("not interactable") || lower.contains("click intercepted") {
        HostError::ElementNotInteractable {
            selector,
            reason: message,
        }
    } else if lower.contains("stale element") {
        HostError::ElementDetached { selector }
    } else if lower.contains("invalid selector") {
        HostError::SelectorInvalid { selector }
    } else if lower.contains("invalid session") || lower.contains("connection") {
        HostError::ConnectionLost
    } else {
        HostError::ScriptError(message)
    }
}

#[async_trait]
impl Host for WebDriverHost {
    async fn launch(&mut self) -> Result<(), HostError> {
        info!("Connecting to WebDriver at {}...", self.options.driver_url);
        let client = WebDriverClient::connect(
            &self.options.driver_url,
            Some(self.options.capabilities()),
        )
        .await
        .map_err(|e| HostError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HostError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| HostError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn goto_url(&self, url: &str, timeout: Duration) -> Result<(), HostError> {
        let client = self.client()?;
        let started = Instant::now();
        match tokio::time::timeout(timeout, client.goto(url)).await {
            Ok(result) => result.map_err(|e| HostError::Navigation(e.to_string()))?,
            Err(_) => {
                return Err(HostError::Timeout {
                    operation: format!("goto {}", url),
                    elapsed: timeout,
                });
            }
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        poll_until(remaining, "document ready", || self.document_complete()).await?;
        debug!("Loaded {}", url);
        Ok(())
    }

    async fn wait_for_selector_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), HostError> {
        let operation = format!("wait for {} to be visible", selector);
        poll_until(timeout, &operation, || self.query_visibility(selector)).await
    }

    async fn click_selector(&self, selector: &str, force: bool) -> Result<(), HostError> {
        if force {
            self.run(DomScript::click(selector, true), selector).await?;
            return Ok(());
        }
        self.find(selector)
            .await?
            .click()
            .await
            .map_err(|e| classify(e, selector))
    }

    async fn fill_selector(&self, selector: &str, value: &str, force: bool) -> Result<(), HostError> {
        if force {
            self.run(DomScript::fill(selector, value, true), selector)
                .await?;
            return Ok(());
        }
        let element = self.find(selector).await?;
        element.clear().await.map_err(|e| classify(e, selector))?;
        element
            .send_keys(value)
            .await
            .map_err(|e| classify(e, selector))
    }

    async fn read_text_content(&self, selector: &str) -> Result<Option<String>, HostError> {
        let value = self.run(DomScript::text_content(selector), selector).await?;
        Ok(value.as_str().map(String::from))
    }

    async fn query_visibility(&self, selector: &str) -> Result<bool, HostError> {
        let value = self.run(DomScript::visible(selector), selector).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn read_all_text_contents(&self, selector: &str) -> Result<Vec<String>, HostError> {
        let value = self
            .run(DomScript::all_text_contents(selector), selector)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), HostError> {
        self.run(DomScript::select_option(selector, value), selector)
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, HostError> {
        let url = self
            .client()?
            .current_url()
            .await
            .map_err(|e| classify(e, "document"))?;
        Ok(url.to_string())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, HostError> {
        self.client()?
            .screenshot()
            .await
            .map_err(|e| HostError::Other(format!("Screenshot failed: {}", e)))
    }
}

/// Opens a new WebDriver session for every scenario attempt.
pub struct WebDriverHostFactory {
    options: WebDriverOptions,
}

impl WebDriverHostFactory {
    pub fn new(options: WebDriverOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl HostFactory for WebDriverHostFactory {
    async fn create(&self) -> Result<Box<dyn Host>, HostError> {
        Ok(Box::new(WebDriverHost::new(self.options.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind() {
        assert!(matches!(locator("#checkout"), Locator::Css("#checkout")));
        assert!(matches!(
            locator("//div[text()='Sauce Labs Onesie']"),
            Locator::XPath(_)
        ));
    }

    #[tokio::test]
    async fn test_unlaunched_host_is_not_ready() {
        let host = WebDriverHost::new(WebDriverOptions {
            driver_url: "http://localhost:9515".into(),
            headless: true,
            window_width: 1280,
            window_height: 720,
            args: vec![],
        });
        assert!(!host.is_ready().await);
        assert_eq!(
            host.click_selector("#checkout", false).await,
            Err(HostError::NotReady)
        );
        assert_eq!(
            host.current_url().await,
            Err(HostError::NotReady)
        );
    }
}
