pub mod request;
pub mod video;

pub use request::{
    AskPayload, ClearCachePayload, ClearTarget, RagRequest, RequestKind, VideoContextPayload,
};
pub use video::{VideoContext, VideoId, VideoIdError};
