use crate::errors::ScrapeError;
use crate::filter::InjectionPolicyConfig;
use crate::results::ExtractionOptions;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable overriding the WebDriver address
pub const WEBDRIVER_URL_ENV: &str = "WEBDRIVER_URL";

/// Environment variable overriding the backend address
pub const BACKEND_URL_ENV: &str = "SCRAPE_BACKEND_URL";

/// Configuration for a scrape session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Endpoint the snapshot is POSTed to
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Directory downloaded results are written to
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Backend request timeout in seconds; no timeout when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Parts of the page captured by default
    #[serde(default)]
    pub options: ExtractionOptions,

    /// Pages the extractor refuses to read
    #[serde(default)]
    pub injection_policy: InjectionPolicyConfig,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default value for backend_url
fn default_backend_url() -> String {
    "http://localhost:5000/scrape".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            backend_url: default_backend_url(),
            download_dir: default_download_dir(),
            request_timeout_secs: None,
            options: ExtractionOptions::default(),
            injection_policy: InjectionPolicyConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScrapeError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
        serde_json::from_str(json).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    /// Apply `WEBDRIVER_URL` / `SCRAPE_BACKEND_URL` overrides from the environment
    pub fn apply_env(self) -> Self {
        self.apply_overrides(
            std::env::var(WEBDRIVER_URL_ENV).ok(),
            std::env::var(BACKEND_URL_ENV).ok(),
        )
    }

    /// Replace the addresses with non-empty overrides
    pub fn apply_overrides(
        mut self,
        webdriver_url: Option<String>,
        backend_url: Option<String>,
    ) -> Self {
        if let Some(url) = webdriver_url.filter(|u| !u.is_empty()) {
            self.webdriver_url = url;
        }
        if let Some(url) = backend_url.filter(|u| !u.is_empty()) {
            self.backend_url = url;
        }
        self
    }

    /// Check that the addresses parse
    pub fn validate(&self) -> Result<(), ScrapeError> {
        Url::parse(&self.backend_url)
            .map_err(|e| ScrapeError::Config(format!("backend_url {}: {}", self.backend_url, e)))?;
        Url::parse(&self.webdriver_url).map_err(|e| {
            ScrapeError::Config(format!("webdriver_url {}: {}", self.webdriver_url, e))
        })?;
        Ok(())
    }
}
