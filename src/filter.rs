use crate::errors::ScrapeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Rules deciding which pages may be read by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPolicyConfig {
    /// URL schemes that can be scraped; browser-internal schemes are not listed
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    /// Regex patterns for privileged pages that refuse script access
    #[serde(default = "default_blocked_patterns")]
    pub blocked_patterns: Vec<String>,
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string(), "file".to_string()]
}

fn default_blocked_patterns() -> Vec<String> {
    vec![
        r"^https://chrome\.google\.com/webstore".to_string(),
        r"^https://chromewebstore\.google\.com/".to_string(),
        r"^https://microsoftedge\.microsoft\.com/addons".to_string(),
        r"^https://addons\.mozilla\.org/".to_string(),
    ]
}

impl Default for InjectionPolicyConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: default_allowed_schemes(),
            blocked_patterns: default_blocked_patterns(),
        }
    }
}

/// Compiled injection policy
#[derive(Debug)]
pub struct InjectionPolicy {
    config: InjectionPolicyConfig,
    blocked_regexes: Vec<Regex>,
}

impl Default for InjectionPolicy {
    fn default() -> Self {
        Self::new(InjectionPolicyConfig::default()).expect("Default regex patterns should be valid")
    }
}

impl InjectionPolicy {
    /// Compile a policy from configuration
    pub fn new(config: InjectionPolicyConfig) -> Result<Self, regex::Error> {
        let mut blocked_regexes = Vec::with_capacity(config.blocked_patterns.len());
        for pattern in &config.blocked_patterns {
            blocked_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            blocked_regexes,
        })
    }

    /// Whether the extractor may read `url`
    pub fn allows(&self, url: &Url) -> bool {
        if !self
            .config
            .allowed_schemes
            .iter()
            .any(|scheme| scheme.eq_ignore_ascii_case(url.scheme()))
        {
            return false;
        }

        let url_str = url.as_str();
        !self.blocked_regexes.iter().any(|regex| regex.is_match(url_str))
    }

    /// Fail with an injection error if `url` is a privileged page
    pub fn check(&self, url: &Url) -> Result<(), ScrapeError> {
        if self.allows(url) {
            Ok(())
        } else {
            ::log::warn!("Refusing to scrape privileged page: {}", url);
            Err(ScrapeError::Injection(format!(
                "cannot access contents of {}",
                url
            )))
        }
    }
}
