use cartwright_engine::config::BrowserConfig;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};

/// Session settings for a WebDriver connection.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    pub driver_url: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub args: Vec<String>,
}

impl From<&BrowserConfig> for WebDriverOptions {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            driver_url: config.driver_url.clone(),
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
            args: config.args.clone(),
        }
    }
}

impl WebDriverOptions {
    /// W3C capabilities understood by both chromedriver and geckodriver.
    /// Each driver ignores the other vendor's options block.
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut chrome_args = self.args.clone();
        chrome_args.push(format!(
            "--window-size={},{}",
            self.window_width, self.window_height
        ));
        let mut firefox_args = vec![
            format!("--width={}", self.window_width),
            format!("--height={}", self.window_height),
        ];
        if self.headless {
            chrome_args.push("--headless=new".to_string());
            firefox_args.push("-headless".to_string());
        }

        let mut caps = Map::new();
        caps.insert("goog:chromeOptions".into(), json!({ "args": chrome_args }));
        caps.insert("moz:firefoxOptions".into(), json!({ "args": firefox_args }));
        caps.insert("pageLoadStrategy".into(), json!("normal"));
        caps
    }
}

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(
        url: &str,
        capabilities: Option<Map<String, Value>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut caps = Map::new();

        // User-provided capabilities override defaults
        if let Some(user_caps) = capabilities {
            for (k, v) in user_caps {
                caps.insert(k, v);
            }
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(url)
            .await
            .map_err(|e| format!("Failed to connect to WebDriver at {}: {}", url, e))?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.client
            .close()
            .await
            .map_err(|e| format!("Failed to close session: {}", e))?;
        Ok(())
    }
}
