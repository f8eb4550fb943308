use std::time::Duration;

use async_trait::async_trait;
use paperline_core::{AppConfig, RecordFields, RecordRoute};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::dispatch::RecordSink;
use crate::error::{Result, SinkError};
use crate::http::RateLimitedClient;

/// Output sink backed by the storage REST API.
pub struct RestSink {
    client: RateLimitedClient,
    api_url: String,
    token: Option<String>,
}

impl RestSink {
    pub fn new(api_url: &str, client: RateLimitedClient) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Every record is sent exactly once: no throttling and no retries.
    /// Resubmission is left to the caller.
    pub fn from_config(api_url: &str, config: &AppConfig) -> Result<Self> {
        let client = RateLimitedClient::new(Duration::ZERO, 0, &config.http.user_agent)?;
        let sink = Self::new(api_url, client);
        Ok(match config.sink_token() {
            Some(token) => sink.with_token(token),
            None => sink,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self, route: RecordRoute) -> String {
        format!("{}/{}", self.api_url, route.api_path())
    }

    fn headers(&self) -> std::result::Result<HeaderMap, SinkError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SinkError::Transport(format!("invalid auth token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl RecordSink for RestSink {
    async fn create_record(&self, route: RecordRoute, record: &RecordFields) -> std::result::Result<(), SinkError> {
        let url = self.endpoint(route);
        let response = self
            .client
            .post_json(&url, record, self.headers()?)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        debug!(%url, status = response.status.as_u16(), "record submitted");

        match response.status {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(SinkError::Conflict(response.body)),
            status => Err(SinkError::Rejected {
                status: status.as_u16(),
                body: response.body,
            }),
        }
    }
}
