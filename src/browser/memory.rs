//! In-memory tab used by tests in place of a WebDriver session.

use crate::browser::Tab;
use crate::errors::ScrapeError;
use crate::parsers::PageSource;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

pub struct MemoryTab {
    page: Option<PageSource>,
    script_result: Value,
    scripts: Mutex<Vec<(String, Vec<Value>)>>,
    gate: Option<Arc<Notify>>,
}

impl MemoryTab {
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            page: Some(PageSource::new(Url::parse(url).unwrap(), html)),
            script_result: Value::Null,
            scripts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// A browser with no open tab
    pub fn closed() -> Self {
        Self {
            page: None,
            script_result: Value::Null,
            scripts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every script run returns `result`
    pub fn with_script_result(mut self, result: Value) -> Self {
        self.script_result = result;
        self
    }

    /// Reading the page waits until `gate` is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn scripts(&self) -> Vec<(String, Vec<Value>)> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tab for MemoryTab {
    async fn active(&self) -> Result<String, ScrapeError> {
        match self.page {
            Some(_) => Ok("memory-tab".to_string()),
            None => Err(ScrapeError::TabResolution("no open windows".to_string())),
        }
    }

    async fn read_page(&self) -> Result<PageSource, ScrapeError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.page
            .clone()
            .ok_or_else(|| ScrapeError::TabResolution("no open windows".to_string()))
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ScrapeError> {
        self.scripts
            .lock()
            .unwrap()
            .push((script.to_string(), args));
        Ok(self.script_result.clone())
    }
}
