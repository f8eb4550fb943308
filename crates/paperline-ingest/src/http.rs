use std::sync::Arc;
use std::time::{Duration, Instant};

use paperline_core::HttpConfig;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{IngestError, Result};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Response of a request whose status the caller interprets itself.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(min_interval: Duration, max_retries: u32, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(
            Duration::from_millis(config.min_interval_ms),
            config.max_retries,
            &config.user_agent,
        )
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET returning the body text; non-success statuses are errors.
    pub async fn get(&self, url: &str) -> Result<String> {
        let response = self
            .send_with_retries(url, || self.client.get(url))
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Api(url.to_string(), format!("HTTP {status}: {body}")));
        }
        Ok(response.text().await?)
    }

    /// POST a JSON body and hand back whatever status the server answered with.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<RawResponse> {
        let response = self
            .send_with_retries(url, || {
                self.client.post(url).headers(headers.clone()).json(body)
            })
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    async fn send_with_retries<F>(&self, url: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            match build().send().await {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    if attempt >= self.max_retries {
                        return Err(IngestError::RateLimit(url.to_string(), wait));
                    }
                    debug!(url, wait, "rate limited, backing off");
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) => return Ok(r),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(IngestError::Http(e));
                    }
                    let backoff = 2u64.pow(attempt);
                    debug!(url, backoff, error = %e, "request failed, retrying");
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn client() -> RateLimitedClient {
        RateLimitedClient::new(Duration::from_secs(0), 0, "paperline-test").unwrap()
    }

    #[tokio::test]
    async fn get_returns_body_text() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .with_status(200)
            .with_body("<feed/>")
            .create_async()
            .await;

        let body = client().get(&format!("{}/query", server.url())).await.unwrap();
        assert_eq!(body, "<feed/>");
    }

    #[tokio::test]
    async fn get_maps_error_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .with_status(500)
            .with_body("down")
            .create_async()
            .await;

        let err = client().get(&format!("{}/query", server.url())).await.unwrap_err();
        assert!(matches!(err, IngestError::Api(_, ref msg) if msg.contains("HTTP 500")));
    }

    #[tokio::test]
    async fn post_hands_back_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/paper")
            .match_header("content-type", "application/json")
            .with_status(409)
            .with_body("exists")
            .create_async()
            .await;

        let response = client()
            .post_json(
                &format!("{}/paper", server.url()),
                &serde_json::json!({"arxiv_id": "0704.0001"}),
                HeaderMap::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body, "exists");
    }

    #[tokio::test]
    async fn rate_limit_without_retries_fails() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .with_status(429)
            .create_async()
            .await;

        let err = client().get(&format!("{}/query", server.url())).await.unwrap_err();
        assert!(matches!(err, IngestError::RateLimit(_, 60)));
    }

    #[tokio::test]
    async fn rate_limit_reports_server_retry_after() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/paper")
            .with_status(429)
            .with_header("retry-after", "7")
            .expect(1)
            .create_async()
            .await;

        let err = client()
            .post_json(&format!("{}/paper", server.url()), &serde_json::json!({}), HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::RateLimit(_, 7)));
        mock.assert_async().await;
    }
}
