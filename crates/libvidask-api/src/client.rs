//! HTTP client for the vidask daemon

use std::time::Duration;

use libvidask_core::session::BrowserEvent;
use libvidask_core::types::{AskPayload, ClearCachePayload};
use libvidask_core::{ClearTarget, VideoContext};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::messages::{AnswerResponse, ErrorBody, EventAccepted, HealthResponse, SessionStatus};
use crate::{ASK_PATH, CLEAR_CACHE_PATH, DEFAULT_TIMEOUT_MS, EVENTS_PATH, HEALTH_PATH, SESSION_PATH};

/// Client for the daemon's HTTP API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl ApiClient {
    /// Create a client for the daemon at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_MS)
    }

    /// Create a client with a custom timeout
    pub fn with_timeout(base_url: &str, timeout_ms: u64) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_ms,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ask a question about a video
    pub async fn ask(&self, query: &str, video: &VideoContext) -> Result<String, ApiError> {
        let body = AskPayload::new(query, video);
        let answer: AnswerResponse = self.post(ASK_PATH, &body).await?;
        Ok(answer.response)
    }

    /// Ask the daemon to clear one video's cache, or all of them
    pub async fn clear(&self, target: &ClearTarget) -> Result<String, ApiError> {
        let body = ClearCachePayload::for_target(target);
        let answer: AnswerResponse = self.post(CLEAR_CACHE_PATH, &body).await?;
        Ok(answer.response)
    }

    /// Relay a browser lifecycle notification
    pub async fn send_event(&self, event: &BrowserEvent) -> Result<EventAccepted, ApiError> {
        self.post(EVENTS_PATH, event).await
    }

    pub async fn session(&self) -> Result<SessionStatus, ApiError> {
        self.get(SESSION_PATH).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get(HEALTH_PATH).await
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let result = self.client.post(url.clone()).json(body).send().await;
        self.decode(url, result).await
    }

    async fn get<R>(&self, path: &str) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let result = self.client.get(url.clone()).send().await;
        self.decode(url, result).await
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    async fn decode<R>(&self, url: Url, result: Result<Response, reqwest::Error>) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let response = result.map_err(|e| self.transport_error(&url, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(&url, e))?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(ApiError::Server {
                status: status.as_u16(),
                body,
            }),
            Err(_) => Err(ApiError::UnexpectedResponse {
                status: status.as_u16(),
                body: text,
            }),
        }
    }

    fn transport_error(&self, url: &Url, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_ms)
        } else {
            ApiError::Unreachable {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(ApiClient::new("mailto:someone@example.com"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_paths_join_onto_base() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.url(ASK_PATH).unwrap().as_str(),
            "http://localhost:3000/api/ask-rag"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) is essentially never served on loopback
        let client = ApiClient::with_timeout("http://127.0.0.1:9", 2_000).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {:?}", err);
    }
}
