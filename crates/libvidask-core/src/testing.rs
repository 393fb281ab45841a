//! In-memory engine for tests
//!
//! Records every request it receives and answers from a scripted responder.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::RagEngine;
use crate::error::{EngineResult, ErrorKind, VidaskError};
use crate::types::{ClearTarget, RagRequest, VideoContext};

type Responder = Box<dyn Fn(&RagRequest) -> EngineResult + Send + Sync>;

pub struct RecordingEngine {
    calls: Mutex<Vec<RagRequest>>,
    responder: Responder,
    delay: Option<Duration>,
}

impl RecordingEngine {
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&RagRequest) -> EngineResult + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            delay: None,
        }
    }

    /// Succeeds with `text` for every request
    pub fn answering(text: &str) -> Self {
        let text = text.to_string();
        Self::with_responder(move |_| Ok(text.clone()))
    }

    /// Fails every request with the given kind and message
    pub fn failing(kind: ErrorKind, message: &str) -> Self {
        let message = message.to_string();
        Self::with_responder(move |_| Err(VidaskError::from_kind(kind, message.clone())))
    }

    /// Sleep before answering, to keep requests in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RagRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Clear requests received so far, in arrival order
    pub fn clear_targets(&self) -> Vec<ClearTarget> {
        self.calls()
            .into_iter()
            .filter_map(|r| match r {
                RagRequest::ClearCache { target } => Some(target),
                RagRequest::Ask { .. } => None,
            })
            .collect()
    }

    /// Poll until at least `count` calls were recorded or `timeout` passes
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.call_count() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.call_count() >= count
    }

    async fn record(&self, request: RagRequest) -> EngineResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&request)
    }
}

#[async_trait]
impl RagEngine for RecordingEngine {
    async fn ask(&self, query: &str, video: &VideoContext) -> EngineResult {
        self.record(RagRequest::Ask {
            query: query.to_string(),
            video: video.clone(),
        })
        .await
    }

    async fn clear(&self, target: &ClearTarget) -> EngineResult {
        self.record(RagRequest::ClearCache {
            target: target.clone(),
        })
        .await
    }
}
