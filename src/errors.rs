use thiserror::Error;

/// Errors raised while resolving a tab, extracting it, or talking to the backend
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No active tab could be found in the browser session
    #[error("no active tab: {0}")]
    TabResolution(String),

    /// The page refused extraction (privileged page, unreadable document)
    #[error("cannot access page contents: {0}")]
    Injection(String),

    /// The request to the backend could not be sent or its body not read
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Failed to process data (HTTP {status})")]
    Backend { status: u16 },

    /// The backend answered with something that is not JSON
    #[error("invalid backend response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// A cycle is already in flight
    #[error("a scrape is already in progress")]
    Busy,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<regex::Error> for ScrapeError {
    fn from(err: regex::Error) -> Self {
        ScrapeError::Config(err.to_string())
    }
}
