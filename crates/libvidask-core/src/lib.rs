//! Core library for vidask
//!
//! Ask questions about the video open in a browser tab. Answers come from an
//! external RAG engine with a per-video cache; this crate decides when that
//! cache must be cleared and how the engine is invoked.

pub mod config;
pub mod engine;
pub mod error;
pub mod router;
pub mod session;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::Config;
pub use engine::{ProcessGateway, RagEngine};
pub use error::{EngineResult, ErrorKind, VidaskError};
pub use router::RequestRouter;
pub use types::{ClearTarget, RagRequest, VideoContext, VideoId};
