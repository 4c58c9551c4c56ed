//! Scrape-and-process cycles against one browser tab.
//!
//! A [`Session`] owns the processed-result slot and the cycle state machine:
//!
//! ```text
//! Idle -> Scraping -> Sending -> Success
//!                             \-> Failed
//! ```
//!
//! `Success` and `Failed` accept the next trigger; a trigger arriving while a
//! cycle is `Scraping` or `Sending` is rejected with [`ScrapeError::Busy`].
//! A cycle whose future is dropped before it finishes ends in `Failed`.

use crate::backend::BackendClient;
use crate::browser::Tab;
use crate::errors::ScrapeError;
use crate::filter::InjectionPolicy;
use crate::parsers::Extractor;
use crate::results::{ExtractionOptions, ProcessedResult};
use crate::utils::{download_file_name, epoch_millis};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// MIME type of downloaded results
pub const DOWNLOAD_MIME_TYPE: &str = "application/json";

/// Status shown when a cycle is abandoned mid-flight
const CANCELLED_STATUS: &str = "Error: cancelled";

/// Phase of the current (or last) cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scraping,
    Sending,
    Success,
    Failed,
}

impl Phase {
    /// Whether a cycle is in flight
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Scraping | Phase::Sending)
    }
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    status: String,
    result: Option<ProcessedResult>,
}

/// Lock the session state, recovering it if a holder panicked
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks a cycle in flight; resets the session to `Failed` if dropped unfinished
struct CycleGuard<'a> {
    state: &'a Mutex<SessionState>,
    finished: bool,
}

impl CycleGuard<'_> {
    fn finish(mut self, outcome: &Result<ProcessedResult, ScrapeError>) {
        let mut state = lock(self.state);
        match outcome {
            Ok(result) => {
                state.phase = Phase::Success;
                state.status = "Success! Data processed.".to_string();
                state.result = Some(result.clone());
            }
            Err(e) => {
                ::log::error!("Scraping error: {}", e);
                state.phase = Phase::Failed;
                state.status = format!("Error: {}", e);
            }
        }
        self.finished = true;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = lock(self.state);
        if state.phase.is_busy() {
            ::log::warn!("Scrape cycle cancelled while {:?}", state.phase);
            state.phase = Phase::Failed;
            state.status = CANCELLED_STATUS.to_string();
            state.result = None;
        }
    }
}

/// A processed result ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl Download {
    /// Write the file into `dir`, returning its path
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ScrapeError> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        ::log::info!("Saved {} ({})", path.display(), self.mime_type);
        Ok(path)
    }
}

/// Drives scrape cycles against a tab and a backend
pub struct Session<T: Tab> {
    tab: T,
    backend: BackendClient,
    policy: InjectionPolicy,
    state: Mutex<SessionState>,
}

impl<T: Tab> Session<T> {
    pub fn new(tab: T, backend: BackendClient) -> Self {
        Self {
            tab,
            backend,
            policy: InjectionPolicy::default(),
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                status: String::new(),
                result: None,
            }),
        }
    }

    /// Replace the injection policy
    pub fn with_policy(mut self, policy: InjectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tab(&self) -> &T {
        &self.tab
    }

    /// Give the tab back, ending the session
    pub fn into_tab(self) -> T {
        self.tab
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    /// Human-readable status of the current (or last) cycle
    pub fn status(&self) -> String {
        lock(&self.state).status.clone()
    }

    /// The processed result of the last successful cycle
    pub fn result(&self) -> Option<ProcessedResult> {
        lock(&self.state).result.clone()
    }

    /// Pretty-printed result, if one is held
    pub fn rendered(&self) -> Option<String> {
        lock(&self.state).result.as_ref().map(ProcessedResult::render)
    }

    /// Run one full cycle: resolve the tab, extract, send, store
    ///
    /// Errors are recorded in the status and also returned. Fails with
    /// [`ScrapeError::Busy`] without touching state if a cycle is in flight.
    pub async fn scrape(&self, options: ExtractionOptions) -> Result<ProcessedResult, ScrapeError> {
        let guard = self.begin()?;
        let outcome = self.run_cycle(options).await;
        guard.finish(&outcome);
        outcome
    }

    /// Move to `Scraping` unless a cycle is already in flight
    fn begin(&self) -> Result<CycleGuard<'_>, ScrapeError> {
        let mut state = lock(&self.state);
        if state.phase.is_busy() {
            ::log::warn!("Ignoring scrape request while {:?}", state.phase);
            return Err(ScrapeError::Busy);
        }
        state.phase = Phase::Scraping;
        state.status = "Scraping page...".to_string();
        state.result = None;
        Ok(CycleGuard {
            state: &self.state,
            finished: false,
        })
    }

    fn set_phase(&self, phase: Phase, status: &str) {
        let mut state = lock(&self.state);
        state.phase = phase;
        state.status = status.to_string();
    }

    async fn run_cycle(&self, options: ExtractionOptions) -> Result<ProcessedResult, ScrapeError> {
        let handle = self.tab.active().await?;
        ::log::debug!("Resolved active tab {}", handle);

        let page = self.tab.read_page().await?;
        self.policy.check(&page.url)?;
        let snapshot = Extractor::extract(&page, &options);
        ::log::info!("Scraped {} ({})", snapshot.url, snapshot.title);

        self.set_phase(Phase::Sending, "Sending to backend...");
        let result = self.backend.process(&snapshot).await?;
        ::log::info!("Backend {} processed {}", self.backend.endpoint(), snapshot.url);
        Ok(result)
    }

    /// The held result as a downloadable file, or `None` when there is nothing to save
    pub fn download(&self) -> Option<Download> {
        let state = lock(&self.state);
        let result = state.result.as_ref()?;
        Some(Download {
            file_name: download_file_name(epoch_millis()),
            mime_type: DOWNLOAD_MIME_TYPE,
            contents: result.render(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::memory::MemoryTab;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head><title>Test Page</title></head><body>
        <h1>Hello</h1>
        <a href="http://a">a</a>
        <a href="javascript:void(0)">js</a>
        <a href="https://b">b</a>
    </body></html>"#;

    async fn backend_returning(status: u16, body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn session(tab: MemoryTab, server: &MockServer) -> Session<MemoryTab> {
        let backend = BackendClient::new(format!("{}/scrape", server.uri()), None).unwrap();
        Session::new(tab, backend)
    }

    fn links_only() -> ExtractionOptions {
        ExtractionOptions {
            scrape_links: true,
            ..ExtractionOptions::default()
        }
    }

    #[tokio::test]
    async fn test_successful_cycle() {
        let server = backend_returning(200, json!({"count": 2})).await;
        let session = session(MemoryTab::new("https://example.com/", PAGE), &server);
        assert_eq!(session.phase(), Phase::Idle);

        let result = session.scrape(links_only()).await.unwrap();
        assert_eq!(result.value()["count"], 2);
        assert_eq!(session.phase(), Phase::Success);
        assert_eq!(session.status(), "Success! Data processed.");
        assert_eq!(
            session.rendered().unwrap(),
            "{\n  \"count\": 2\n}"
        );

        // The backend saw the snapshot with only the links fields
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["title"], "Test Page");
        assert_eq!(sent["linksCount"], 2);
        assert_eq!(sent["links"].as_array().unwrap().len(), 2);
        assert!(sent.get("text").is_none());
        assert!(sent.get("headings").is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_disables_download() {
        let server = backend_returning(500, json!({"error": "boom"})).await;
        let session = session(MemoryTab::new("https://example.com/", PAGE), &server);

        let err = session.scrape(links_only()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Backend { status: 500 }));
        assert_eq!(session.phase(), Phase::Failed);
        assert!(session.status().starts_with("Error: "));
        assert!(session.result().is_none());
        assert!(session.download().is_none());
    }

    #[tokio::test]
    async fn test_failed_cycle_clears_previous_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 1})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let session = session(MemoryTab::new("https://example.com/", PAGE), &server);

        session.scrape(links_only()).await.unwrap();
        assert!(session.download().is_some());

        assert!(session.scrape(links_only()).await.is_err());
        assert_eq!(session.phase(), Phase::Failed);
        assert!(session.download().is_none());
    }

    #[tokio::test]
    async fn test_missing_tab_fails_cycle() {
        let server = backend_returning(200, json!({})).await;
        let session = session(MemoryTab::closed(), &server);

        let err = session.scrape(links_only()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::TabResolution(_)));
        assert_eq!(session.phase(), Phase::Failed);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_privileged_page_is_injection_error() {
        let server = backend_returning(200, json!({})).await;
        let session = session(MemoryTab::new("chrome://settings/", "<body></body>"), &server);

        let err = session.scrape(links_only()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Injection(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_while_busy_is_rejected() {
        let server = backend_returning(200, json!({"done": true})).await;
        let gate = Arc::new(Notify::new());
        let tab = MemoryTab::new("https://example.com/", PAGE).with_gate(gate.clone());
        let session = Arc::new(session(tab, &server));

        let running = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.scrape(links_only()).await })
        };

        while session.phase() != Phase::Scraping {
            tokio::task::yield_now().await;
        }

        let err = session.scrape(links_only()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Busy));
        assert_eq!(session.phase(), Phase::Scraping);

        gate.notify_one();
        let result = running.await.unwrap().unwrap();
        assert_eq!(result.value()["done"], true);
        assert_eq!(session.phase(), Phase::Success);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_cycle_releases_session() {
        let server = backend_returning(200, json!({"again": true})).await;
        let gate = Arc::new(Notify::new());
        let tab = MemoryTab::new("https://example.com/", PAGE).with_gate(gate.clone());
        let session = session(tab, &server);

        let first = tokio::time::timeout(Duration::from_millis(50), session.scrape(links_only())).await;
        assert!(first.is_err());
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.status(), "Error: cancelled");
        assert!(session.download().is_none());

        // The gate permit is stored for the next read_page
        gate.notify_one();
        let result = session.scrape(links_only()).await.unwrap();
        assert_eq!(result.value()["again"], true);
        assert_eq!(session.phase(), Phase::Success);
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let body = json!({
            "original_url": "https://example.com/",
            "summary": {"links_stats": {"total_count": 2, "unique_domains": 2}},
            "links": [{"text": "a", "href": "http://a/"}],
            "unicode": "héllo ✓"
        });
        let server = backend_returning(200, body.clone()).await;
        let session = session(MemoryTab::new("https://example.com/", PAGE), &server);
        assert!(session.download().is_none());

        session.scrape(links_only()).await.unwrap();
        let download = session.download().unwrap();
        assert!(download.file_name.starts_with("scraped-data-"));
        assert!(download.file_name.ends_with(".json"));
        assert_eq!(download.mime_type, "application/json");

        let dir = tempfile::tempdir().unwrap();
        let saved = download.save_to(dir.path()).unwrap();
        let reparsed: Value = serde_json::from_str(&std::fs::read_to_string(saved).unwrap()).unwrap();
        assert_eq!(reparsed, body);
        assert_eq!(&reparsed, session.result().unwrap().value());
    }
}
