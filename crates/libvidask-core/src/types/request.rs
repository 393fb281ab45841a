use serde::{Deserialize, Serialize};

use super::video::{VideoContext, VideoId};

/// Engine flag selecting cache-clear mode
pub const CLEAR_CACHE_FLAG: &str = "--clear-cache";

/// Engine flag selecting every cached video
pub const ALL_FLAG: &str = "--all";

/// Which per-video cache entries a clear request targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClearTarget {
    Video(VideoId),
    All,
}

impl std::fmt::Display for ClearTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClearTarget::Video(id) => write!(f, "{}", id),
            ClearTarget::All => f.write_str("*"),
        }
    }
}

/// Kind of engine invocation, used for logging and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Ask,
    ClearCache,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Ask => write!(f, "ask"),
            RequestKind::ClearCache => write!(f, "clear-cache"),
        }
    }
}

/// A validated request for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RagRequest {
    Ask { query: String, video: VideoContext },
    ClearCache { target: ClearTarget },
}

impl RagRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            RagRequest::Ask { .. } => RequestKind::Ask,
            RagRequest::ClearCache { .. } => RequestKind::ClearCache,
        }
    }

    /// Positional arguments handed to the engine process
    pub fn engine_args(&self) -> Vec<String> {
        match self {
            RagRequest::Ask { query, video } => vec![query.clone(), video.video_id.to_string()],
            RagRequest::ClearCache { target } => clear_args(target),
        }
    }
}

/// `["--clear-cache", "--all"]` or `["--clear-cache", <id>]`
pub fn clear_args(target: &ClearTarget) -> Vec<String> {
    let selector = match target {
        ClearTarget::All => ALL_FLAG.to_string(),
        ClearTarget::Video(id) => id.to_string(),
    };
    vec![CLEAR_CACHE_FLAG.to_string(), selector]
}

// Inbound payloads. Every field is optional so that validation, not
// deserialization, decides what is missing.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContextPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Body of an ask request: `{ query, videoContext: { videoId, title?, url? } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_context: Option<VideoContextPayload>,
}

impl AskPayload {
    pub fn new(query: impl Into<String>, video: &VideoContext) -> Self {
        Self {
            query: Some(query.into()),
            video_context: Some(VideoContextPayload {
                video_id: Some(video.video_id.to_string()),
                title: Some(video.title.clone()),
                url: Some(video.url.clone()),
            }),
        }
    }
}

/// Body of a clear request: `{ videoId?, clearAll? }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCachePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_all: Option<bool>,
}

impl ClearCachePayload {
    pub fn for_target(target: &ClearTarget) -> Self {
        match target {
            ClearTarget::All => Self {
                video_id: None,
                clear_all: Some(true),
            },
            ClearTarget::Video(id) => Self {
                video_id: Some(id.to_string()),
                clear_all: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoContext {
        VideoContext::new(VideoId::parse(id).unwrap(), None, None)
    }

    #[test]
    fn test_ask_args() {
        let request = RagRequest::Ask {
            query: "what is this about?".to_string(),
            video: video("abc123"),
        };
        assert_eq!(request.engine_args(), vec!["what is this about?", "abc123"]);
        assert_eq!(request.kind(), RequestKind::Ask);
    }

    #[test]
    fn test_clear_args() {
        let targeted = RagRequest::ClearCache {
            target: ClearTarget::Video(VideoId::parse("abc123").unwrap()),
        };
        assert_eq!(targeted.engine_args(), vec!["--clear-cache", "abc123"]);

        let wildcard = RagRequest::ClearCache { target: ClearTarget::All };
        assert_eq!(wildcard.engine_args(), vec!["--clear-cache", "--all"]);
    }

    #[test]
    fn test_payloads_use_camel_case() {
        let payload: AskPayload =
            serde_json::from_str(r#"{"query":"q","videoContext":{"videoId":"abc","title":"T"}}"#).unwrap();
        assert_eq!(payload.query.as_deref(), Some("q"));
        assert_eq!(
            payload.video_context.unwrap().video_id.as_deref(),
            Some("abc")
        );

        let clear: ClearCachePayload = serde_json::from_str(r#"{"clearAll":true}"#).unwrap();
        assert_eq!(clear.clear_all, Some(true));
        assert_eq!(clear.video_id, None);
    }

    #[test]
    fn test_clear_payload_for_target() {
        let json = serde_json::to_value(ClearCachePayload::for_target(&ClearTarget::All)).unwrap();
        assert_eq!(json, serde_json::json!({"clearAll": true}));

        let id = VideoId::parse("xyz789").unwrap();
        let json = serde_json::to_value(ClearCachePayload::for_target(&ClearTarget::Video(id))).unwrap();
        assert_eq!(json, serde_json::json!({"videoId": "xyz789"}));
    }
}
