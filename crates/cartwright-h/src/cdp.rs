use cartwright_engine::config::BrowserConfig as CartwrightBrowserConfig;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Launch settings for a Chromium instance.
#[derive(Debug, Clone)]
pub struct CdpOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub args: Vec<String>,
}

impl From<&CartwrightBrowserConfig> for CdpOptions {
    fn from(config: &CartwrightBrowserConfig) -> Self {
        Self {
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
            args: config.args.clone(),
        }
    }
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(
        options: &CdpOptions,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut config_builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .args(options.args.iter().cloned());
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if options.headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        }

        // Support custom Chrome path via CHROME_BIN environment variable
        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let config = match config_builder.build() {
            Ok(config) => config,
            Err(e) => {
                remove_profile(&user_data_dir, cleanup_user_data_dir);
                return Err(format!("Failed to build browser config: {}", e).into());
            }
        };
        let (mut browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile(&user_data_dir, cleanup_user_data_dir);
                return Err(format!("Failed to launch browser: {}", e).into());
            }
        };

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::debug!("Failed to close browser after launch error: {}", close_err);
                }
                if let Err(join_err) = handler_task.await {
                    tracing::debug!("Browser handler task failed: {}", join_err);
                }
                remove_profile(&user_data_dir, cleanup_user_data_dir);
                return Err(e);
            }
        };

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if let Some(dir) = &self.user_data_dir {
            remove_profile(dir, self.cleanup_user_data_dir);
        }

        Ok(())
    }
}

/// A blank page with console logging and dialog auto-accept attached.
async fn open_page(browser: &Browser) -> Result<Page, Box<dyn std::error::Error + Send + Sync>> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| format!("Failed to create page: {}", e))?;

    let mut console_events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

    tokio::spawn(async move {
        while let Some(event) = console_events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| {
                    arg.description
                        .clone()
                        .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                        .unwrap_or_else(|| "unknown".to_string())
                })
                .collect();
            tracing::debug!("Browser console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });

    // Alerts would block every later script call, so accept them.
    let mut dialog_events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

    let dialog_page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialog_events.next().await {
            tracing::info!(
                "Accepting JavaScript dialog: {} ({:?})",
                event.message,
                event.r#type
            );
            if let Err(e) = dialog_page
                .execute(HandleJavaScriptDialogParams::new(true))
                .await
            {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    });

    Ok(page)
}

/// Delete a per-launch profile. Pinned profiles are left alone.
fn remove_profile(dir: &Path, owned: bool) {
    if !owned {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dir) {
        tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
    }
}

/// Every launch gets its own profile so parallel scenarios share no
/// cookies or storage. `CARTWRIGHT_USER_DATA_DIR` pins a profile instead.
fn resolve_user_data_dir() -> Result<(PathBuf, bool), Box<dyn std::error::Error + Send + Sync>> {
    if let Ok(dir) = std::env::var("CARTWRIGHT_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!(
            "Using user data dir from CARTWRIGHT_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let unique = format!("cartwright-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::debug!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn leftover_profiles() -> Vec<PathBuf> {
        let prefix = format!("cartwright-profile-{}-", std::process::id());
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect()
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_launch_removes_profile() {
        // SAFETY: serialized with every other test touching these variables.
        unsafe {
            std::env::remove_var("CARTWRIGHT_USER_DATA_DIR");
            std::env::set_var("CHROME_BIN", "/nonexistent/cartwright/chrome");
        }
        let options = CdpOptions {
            headless: true,
            window_width: 800,
            window_height: 600,
            args: vec![],
        };
        let result = CdpClient::launch(&options).await;
        unsafe {
            std::env::remove_var("CHROME_BIN");
        }

        assert!(result.is_err());
        assert!(leftover_profiles().is_empty());
    }

    #[test]
    fn test_pinned_profile_is_kept() {
        let dir = std::env::temp_dir().join(format!("cartwright-pinned-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        remove_profile(&dir, false);
        assert!(dir.exists());

        remove_profile(&dir, true);
        assert!(!dir.exists());
    }
}
