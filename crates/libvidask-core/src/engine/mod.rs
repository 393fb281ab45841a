//! RAG engine capability
//!
//! The router, tracker and dispatcher only see [`RagEngine`]. The default
//! implementation is [`ProcessGateway`], which runs the external engine as a
//! subprocess per request; an in-process or networked engine can be swapped
//! in without touching the session logic.

pub mod process;

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::types::{ClearTarget, RagRequest, VideoContext};

pub use process::ProcessGateway;

#[async_trait]
pub trait RagEngine: Send + Sync {
    /// Answer `query` about `video`
    async fn ask(&self, query: &str, video: &VideoContext) -> EngineResult;

    /// Drop cached transcript/embeddings for one video or for all of them
    async fn clear(&self, target: &ClearTarget) -> EngineResult;

    async fn execute(&self, request: &RagRequest) -> EngineResult {
        match request {
            RagRequest::Ask { query, video } => self.ask(query, video).await,
            RagRequest::ClearCache { target } => self.clear(target).await,
        }
    }
}
