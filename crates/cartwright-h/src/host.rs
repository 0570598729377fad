use crate::cdp::{CdpClient, CdpOptions};
use async_trait::async_trait;
use cartwright_engine::dom::{DomScript, reply_value};
use cartwright_engine::host::{Host, HostError, poll_until};
use cartwright_engine::runner::HostFactory;
use chromiumoxide::Page;
use chromiumoxide::page::ScreenshotParams;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Chromium driven over CDP. Every primitive runs as a DOM script in the
/// page, with the actionability checks done by the script.
pub struct CdpHost {
    client: Option<CdpClient>,
    options: CdpOptions,
}

impl CdpHost {
    pub fn new(options: CdpOptions) -> Self {
        Self {
            client: None,
            options,
        }
    }

    fn page(&self) -> Result<&Page, HostError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(HostError::NotReady)
    }

    async fn run(&self, script: DomScript, selector: &str) -> Result<Value, HostError> {
        let result = self
            .page()?
            .evaluate(script.cdp_expression())
            .await
            .map_err(|e| HostError::ScriptError(e.to_string()))?;
        // A missing value means the context was torn down mid-call.
        let raw = result.into_value::<Value>().unwrap_or(Value::Null);
        reply_value(raw, selector)
    }

    async fn document_complete(&self) -> Result<bool, HostError> {
        let state = self.run(DomScript::ready_state(), "document").await?;
        Ok(state.as_str() == Some("complete"))
    }
}

#[async_trait]
impl Host for CdpHost {
    async fn launch(&mut self) -> Result<(), HostError> {
        info!("Launching Chromium...");
        let client = CdpClient::launch(&self.options)
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
        let page = self.page()?;
        let started = Instant::now();
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(result) => {
                result.map_err(|e| HostError::Navigation(e.to_string()))?;
            }
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
        self.run(DomScript::click(selector, force), selector).await?;
        Ok(())
    }

    async fn fill_selector(&self, selector: &str, value: &str, force: bool) -> Result<(), HostError> {
        self.run(DomScript::fill(selector, value, force), selector)
            .await?;
        Ok(())
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
            .page()?
            .url()
            .await
            .map_err(|e| HostError::Other(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, HostError> {
        self.page()?
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| HostError::Other(format!("Screenshot failed: {}", e)))
    }
}

/// Launches a fresh Chromium for every scenario attempt.
pub struct CdpHostFactory {
    options: CdpOptions,
}

impl CdpHostFactory {
    pub fn new(options: CdpOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl HostFactory for CdpHostFactory {
    async fn create(&self) -> Result<Box<dyn Host>, HostError> {
        Ok(Box::new(CdpHost::new(self.options.clone())))
    }
}
