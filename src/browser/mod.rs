pub mod webdriver;

#[cfg(test)]
pub mod memory;

use crate::errors::ScrapeError;
use crate::parsers::PageSource;
use async_trait::async_trait;
use serde_json::Value;

pub use webdriver::WebDriverTab;

/// A browser tab the scraper can read from
#[async_trait]
pub trait Tab: Send + Sync {
    /// Resolve the currently focused tab, returning its handle
    async fn active(&self) -> Result<String, ScrapeError>;

    /// Read the tab's current address and live DOM
    async fn read_page(&self) -> Result<PageSource, ScrapeError>;

    /// Run a script in the page and return its JSON result
    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ScrapeError>;
}
