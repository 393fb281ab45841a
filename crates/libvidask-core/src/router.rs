//! Request router - validates inbound payloads and forwards them to the engine
//!
//! Validation and configuration problems are reported before any engine work
//! starts. Each accepted request results in exactly one engine call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::RagEngine;
use crate::error::{EngineResult, VidaskError};
use crate::types::request::CLEAR_CACHE_FLAG;
use crate::types::{AskPayload, ClearCachePayload, ClearTarget, RagRequest, VideoContext, VideoId};

#[derive(Clone)]
pub struct RequestRouter {
    engine: Arc<dyn RagEngine>,
}

impl RequestRouter {
    pub fn new(engine: Arc<dyn RagEngine>) -> Self {
        Self { engine }
    }

    /// Validate an ask payload into a [`RagRequest::Ask`]
    pub fn validate_ask(payload: &AskPayload) -> Result<RagRequest, VidaskError> {
        let raw_query = payload.query.as_deref().unwrap_or_default();
        let query = raw_query.trim();
        if query.is_empty() {
            return Err(VidaskError::InvalidArgument("Query is required.".to_string()));
        }
        if query.split_whitespace().next() == Some(CLEAR_CACHE_FLAG) {
            return Err(VidaskError::InvalidArgument(format!(
                "Query may not start with the reserved engine flag {}.",
                CLEAR_CACHE_FLAG
            )));
        }

        let context = payload.video_context.as_ref();
        let raw_id = context
            .and_then(|c| c.video_id.as_deref())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                VidaskError::InvalidArgument("Video ID is required in videoContext.".to_string())
            })?;
        let video_id = VideoId::parse(raw_id).map_err(|e| VidaskError::InvalidArgument(e.to_string()))?;

        let video = VideoContext::new(
            video_id,
            context.and_then(|c| c.title.clone()),
            context.and_then(|c| c.url.clone()),
        );

        // The trimmed form is only for validation; the engine gets the text as sent
        Ok(RagRequest::Ask {
            query: raw_query.to_string(),
            video,
        })
    }

    /// Validate a clear payload into a [`RagRequest::ClearCache`].
    /// `clearAll` wins over `videoId` when both are present.
    pub fn validate_clear(payload: &ClearCachePayload) -> Result<RagRequest, VidaskError> {
        if payload.clear_all == Some(true) {
            return Ok(RagRequest::ClearCache {
                target: ClearTarget::All,
            });
        }

        match payload.video_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(raw_id) => {
                let id = VideoId::parse(raw_id).map_err(|e| VidaskError::InvalidArgument(e.to_string()))?;
                Ok(RagRequest::ClearCache {
                    target: ClearTarget::Video(id),
                })
            }
            None => Err(VidaskError::InvalidArgument(
                "Either videoId or clearAll flag is required for clearing cache.".to_string(),
            )),
        }
    }

    pub async fn ask(&self, payload: &AskPayload) -> EngineResult {
        let request = Self::validate_ask(payload).map_err(|e| {
            warn!("Rejected ask request: {}", e);
            e
        })?;
        self.submit(&request).await
    }

    pub async fn clear_cache(&self, payload: &ClearCachePayload) -> EngineResult {
        let request = Self::validate_clear(payload).map_err(|e| {
            warn!("Rejected clear-cache request: {}", e);
            e
        })?;
        self.submit(&request).await
    }

    /// Clear a target that is already known to be well-formed
    pub async fn clear(&self, target: &ClearTarget) -> EngineResult {
        self.submit(&RagRequest::ClearCache {
            target: target.clone(),
        })
        .await
    }

    /// Forward an already-validated request to the engine
    pub async fn submit(&self, request: &RagRequest) -> EngineResult {
        match request {
            RagRequest::Ask { query, video } => {
                info!(video_id = %video.video_id, "Received query: \"{}\"", query);
            }
            RagRequest::ClearCache { target: ClearTarget::All } => {
                info!("Request to clear all video caches");
            }
            RagRequest::ClearCache { target: ClearTarget::Video(id) } => {
                info!(video_id = %id, "Request to clear cache for video");
            }
        }
        let result = self.engine.execute(request).await;
        debug!(kind = %request.kind(), ok = result.is_ok(), "Engine call completed");
        result
    }
}
