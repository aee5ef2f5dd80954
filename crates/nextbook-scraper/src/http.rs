use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Result, ScrapeError};

// ─── PoliteClient ─────────────────────────────────────────────────────────────

/// A GET-only HTTP client that spaces requests at least `min_interval` apart.
///
/// Each request is attempted exactly once; there is no retry and no timeout
/// beyond reqwest's defaults.
#[derive(Clone)]
pub struct PoliteClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl PoliteClient {
    pub fn new(min_interval: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    async fn wait_for_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET `url` and return the body as text. Non-2xx responses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.wait_for_turn().await;
        debug!(url, "GET");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn get_text_returns_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ping")
            .with_status(200)
            .with_body("pong")
            .create_async()
            .await;

        let client = PoliteClient::new(Duration::ZERO, "nextbook-test").unwrap();
        let body = client.get_text(&format!("{}/ping", server.url())).await.unwrap();
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn non_success_status_is_error_and_not_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = PoliteClient::new(Duration::ZERO, "nextbook-test").unwrap();
        let err = client
            .get_text(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn requests_are_spaced_by_min_interval() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ping")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let client = PoliteClient::new(Duration::from_millis(200), "nextbook-test").unwrap();
        let url = format!("{}/ping", server.url());

        let start = Instant::now();
        client.get_text(&url).await.unwrap();
        client.get_text(&url).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
