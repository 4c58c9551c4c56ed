use crate::browser::Tab;
use crate::errors::ScrapeError;
use crate::parsers::PageSource;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::Value;

/// Driver addresses tried when the configured one refuses the connection
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// The active window of a WebDriver session
pub struct WebDriverTab {
    client: Client,
}

impl WebDriverTab {
    /// Open a session on `webdriver_url`, falling back to the common driver ports
    pub async fn connect(webdriver_url: &str) -> Result<Self, ScrapeError> {
        match ClientBuilder::native().connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self { client });
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            }
        }

        for url in FALLBACK_WEBDRIVER_URLS {
            if *url == webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = ClientBuilder::native().connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self { client });
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(ScrapeError::TabResolution(format!(
            "failed to connect to any WebDriver server (tried {})",
            webdriver_url
        )))
    }

    /// Wrap an existing session
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Load `url` in the active window
    pub async fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        ::log::info!("Navigating to {}", url);
        self.client
            .goto(url)
            .await
            .map_err(|e| command_error(e, "navigating to", url))
    }

    /// End the WebDriver session
    pub async fn close(self) -> Result<(), ScrapeError> {
        self.client
            .close()
            .await
            .map_err(|e| ScrapeError::TabResolution(e.to_string()))
    }
}

#[async_trait]
impl Tab for WebDriverTab {
    async fn active(&self) -> Result<String, ScrapeError> {
        let windows = self
            .client
            .windows()
            .await
            .map_err(|e| ScrapeError::TabResolution(e.to_string()))?;
        if windows.is_empty() {
            return Err(ScrapeError::TabResolution("no open windows".to_string()));
        }

        let handle = self
            .client
            .window()
            .await
            .map_err(|e| ScrapeError::TabResolution(e.to_string()))?;
        Ok(String::from(handle))
    }

    async fn read_page(&self) -> Result<PageSource, ScrapeError> {
        let url = self
            .client
            .current_url()
            .await
            .map_err(|e| command_error(e, "reading the address of", "active tab"))?;
        let html = self
            .client
            .source()
            .await
            .map_err(|e| command_error(e, "getting source for", url.as_str()))?;
        Ok(PageSource::new(url, html))
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ScrapeError> {
        self.client
            .execute(script, args)
            .await
            .map_err(|e| command_error(e, "running a script in", "active tab"))
    }
}

/// Classify a WebDriver command failure: a lost session means the tab is
/// gone, anything else means the page could not be accessed
fn command_error(error: CmdError, context: &str, target: &str) -> ScrapeError {
    let message = error.to_string();
    if message.contains("Unable to find session") || message.contains("invalid session id") {
        ::log::warn!("Lost session while {} {}", context, target);
        ScrapeError::TabResolution(message)
    } else {
        ::log::error!("Failed {} {}: {}", context, target, message);
        ScrapeError::Injection(format!("{} {}: {}", context, target, message))
    }
}
