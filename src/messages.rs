//! Content-script style requests answered against the active tab.
//!
//! Requests are JSON objects with an `action` field. Unknown actions and
//! malformed requests get no response.

use crate::browser::Tab;
use crate::errors::ScrapeError;
use crate::parsers::html;
use crate::results::MetaTag;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const READY_STATE_SCRIPT: &str =
    "return { readyState: document.readyState, loadTime: performance.now() };";

const HIGHLIGHT_SCRIPT: &str = "let element; \
     try { element = document.querySelector(arguments[0]); } \
     catch (e) { return 'invalid-selector'; } \
     if (!element) { return false; } \
     element.style.border = '3px solid red'; \
     return true;";

/// Returned by the highlight script when `querySelector` throws
const INVALID_SELECTOR: &str = "invalid-selector";

const METRICS_SCRIPT: &str = "const nav = performance.getEntriesByType('navigation')[0]; \
     if (!nav) { return null; } \
     return { \
       loadTime: nav.loadEventEnd - nav.loadEventStart, \
       domContentLoaded: nav.domContentLoadedEventEnd - nav.domContentLoadedEventStart, \
       responseTime: nav.responseEnd - nav.requestStart \
     };";

/// A request understood by the content script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentRequest {
    GetPageData,
    HighlightElement { selector: String },
    GetMetaTags,
    ExtractStructuredData,
    GetPageMetrics,
}

impl ContentRequest {
    /// Parse a raw request; `None` for unknown actions or malformed bodies
    pub fn parse(raw: &Value) -> Option<Self> {
        match serde_json::from_value(raw.clone()) {
            Ok(request) => Some(request),
            Err(e) => {
                ::log::debug!("Ignoring message {}: {}", raw, e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub url: String,
    pub title: String,
    pub ready_state: String,
    /// Milliseconds since navigation start
    pub load_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub load_time: f64,
    pub dom_content_loaded: f64,
    pub response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentResponse {
    PageData(PageData),
    Highlight {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    MetaTags { meta_tags: Vec<MetaTag> },
    #[serde(rename_all = "camelCase")]
    StructuredData { structured_data: Vec<Value> },
    Metrics { metrics: Option<PageMetrics> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadyState {
    ready_state: String,
    load_time: f64,
}

/// Answers content-script requests for one tab
pub struct ContentScript<'a, T: Tab> {
    tab: &'a T,
}

impl<'a, T: Tab> ContentScript<'a, T> {
    pub fn new(tab: &'a T) -> Self {
        Self { tab }
    }

    /// Handle a raw JSON request
    pub async fn handle_raw(&self, raw: &Value) -> Result<Option<Value>, ScrapeError> {
        let Some(request) = ContentRequest::parse(raw) else {
            return Ok(None);
        };
        let response = self.handle(&request).await?;
        Ok(Some(serde_json::to_value(response)?))
    }

    pub async fn handle(&self, request: &ContentRequest) -> Result<ContentResponse, ScrapeError> {
        ::log::debug!("Handling {:?}", request);
        match request {
            ContentRequest::GetPageData => self.page_data().await.map(ContentResponse::PageData),
            ContentRequest::HighlightElement { selector } => self.highlight(selector).await,
            ContentRequest::GetMetaTags => {
                let doc = self.document().await?;
                Ok(ContentResponse::MetaTags {
                    meta_tags: html::meta_tags(&doc),
                })
            }
            ContentRequest::ExtractStructuredData => {
                let doc = self.document().await?;
                Ok(ContentResponse::StructuredData {
                    structured_data: html::structured_data(&doc),
                })
            }
            ContentRequest::GetPageMetrics => Ok(ContentResponse::Metrics {
                metrics: self.metrics().await?,
            }),
        }
    }

    async fn document(&self) -> Result<Html, ScrapeError> {
        let page = self.tab.read_page().await?;
        Ok(Html::parse_document(&page.html))
    }

    async fn page_data(&self) -> Result<PageData, ScrapeError> {
        let page = self.tab.read_page().await?;
        let title = html::title(&Html::parse_document(&page.html));

        let raw = self.tab.run_script(READY_STATE_SCRIPT, Vec::new()).await?;
        let ready: ReadyState = serde_json::from_value(raw)
            .map_err(|e| ScrapeError::Injection(format!("unexpected readyState result: {}", e)))?;

        Ok(PageData {
            url: page.url.to_string(),
            title,
            ready_state: ready.ready_state,
            load_time: ready.load_time,
        })
    }

    /// The page's own `querySelector` decides whether the selector is valid
    async fn highlight(&self, selector: &str) -> Result<ContentResponse, ScrapeError> {
        let outcome = self
            .tab
            .run_script(HIGHLIGHT_SCRIPT, vec![json!(selector)])
            .await?;
        let error = match outcome {
            Value::Bool(true) => None,
            Value::String(s) if s == INVALID_SELECTOR => {
                Some(format!("Invalid selector: {}", selector))
            }
            _ => Some("Element not found".to_string()),
        };
        Ok(ContentResponse::Highlight {
            success: error.is_none(),
            error,
        })
    }

    async fn metrics(&self) -> Result<Option<PageMetrics>, ScrapeError> {
        let raw = self.tab.run_script(METRICS_SCRIPT, Vec::new()).await?;
        if raw.is_null() {
            return Ok(None);
        }
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| ScrapeError::Injection(format!("unexpected metrics result: {}", e)))
    }
}
