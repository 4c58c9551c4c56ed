// Re-export modules
pub mod backend;
pub mod browser;
pub mod config;
pub mod errors;
pub mod filter;
pub mod messages;
pub mod parsers;
pub mod results;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use browser::{Tab, WebDriverTab};
pub use errors::ScrapeError;
pub use results::{ExtractionOptions, PageSnapshot, ProcessedResult};
pub use session::{Download, Phase, Session};

use backend::BackendClient;
use config::ScraperConfig;
use filter::InjectionPolicy;
use std::time::Duration;

/// Builder wiring a WebDriver tab and a backend into a [`Session`]
pub struct Scraper {
    config: ScraperConfig,
    start_url: Option<String>,
}

impl Scraper {
    /// Create a builder from configuration
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            start_url: None,
        }
    }

    /// Navigate the tab to `url` once connected
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = Some(url.into());
        self
    }

    /// Set the backend request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.request_timeout_secs = Some(timeout_seconds);
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Build the backend client alone
    pub fn backend(&self) -> Result<BackendClient, ScrapeError> {
        BackendClient::new(
            self.config.backend_url.clone(),
            self.config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Connect to WebDriver and return a ready session
    pub async fn connect(self) -> Result<Session<WebDriverTab>, ScrapeError> {
        self.config.validate()?;
        let backend = self.backend()?;
        let policy = InjectionPolicy::new(self.config.injection_policy.clone())?;

        ::log::info!("Connecting to WebDriver at {}", self.config.webdriver_url);
        let tab = WebDriverTab::connect(&self.config.webdriver_url).await?;
        if let Some(url) = &self.start_url {
            tab.navigate(url).await?;
        }

        Ok(Session::new(tab, backend).with_policy(policy))
    }
}
