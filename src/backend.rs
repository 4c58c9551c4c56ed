use crate::errors::ScrapeError;
use crate::results::{PageSnapshot, ProcessedResult};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// HTTP client for the processing backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    endpoint: String,
}

impl BackendClient {
    /// Create a client posting to `endpoint`, with an optional request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ScrapeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the snapshot as JSON and parse the processed result
    ///
    /// Any non-success status is a failure, whatever the body says.
    pub async fn process(&self, snapshot: &PageSnapshot) -> Result<ProcessedResult, ScrapeError> {
        ::log::debug!("POST {} for {}", self.endpoint, snapshot.url);

        let response = self
            .client
            .post(&self.endpoint)
            .json(snapshot)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            ::log::error!("Backend {} answered {}", self.endpoint, status);
            return Err(ScrapeError::Backend {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(ProcessedResult::new(value))
    }

    /// Address of the backend health check: `/health` next to the endpoint
    pub fn health_url(&self) -> Result<Url, ScrapeError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| ScrapeError::Config(format!("backend_url {}: {}", self.endpoint, e)))?;
        endpoint
            .join("/health")
            .map_err(|e| ScrapeError::Config(e.to_string()))
    }

    /// GET the health endpoint and return its JSON body
    pub async fn health(&self) -> Result<Value, ScrapeError> {
        let url = self.health_url()?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Backend {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{LinkSet, Link};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot() -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            text: None,
            links: Some(LinkSet {
                links: vec![Link {
                    text: "a".to_string(),
                    href: "http://a/".to_string(),
                }],
                links_count: 1,
            }),
            images: None,
            headings: None,
        }
    }

    #[tokio::test]
    async fn test_posts_snapshot_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "url": "https://example.com/",
                "title": "Example",
                "timestamp": "2024-01-01T00:00:00.000Z",
                "links": [{"text": "a", "href": "http://a/"}],
                "linksCount": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page_title": "Example"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(format!("{}/scrape", server.uri()), None).unwrap();
        let result = client.process(&snapshot()).await.unwrap();
        assert_eq!(result.value(), &json!({"page_title": "Example"}));
    }

    #[tokio::test]
    async fn test_error_status_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = BackendClient::new(format!("{}/scrape", server.uri()), None).unwrap();
        let err = client.process(&snapshot()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Backend { status: 500 }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = BackendClient::new(format!("{}/scrape", server.uri()), None).unwrap();
        let err = client.process(&snapshot()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) is not listening on test machines
        let client = BackendClient::new("http://127.0.0.1:9/scrape", None).unwrap();
        let err = client.process(&snapshot()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Network(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(&server)
            .await;

        let client = BackendClient::new(format!("{}/scrape", server.uri()), None).unwrap();
        assert_eq!(
            client.health_url().unwrap().as_str(),
            format!("{}/health", server.uri())
        );
        let health = client.health().await.unwrap();
        assert_eq!(health["status"], "healthy");
    }
}
