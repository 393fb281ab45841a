use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::request::{ALL_FLAG, CLEAR_CACHE_FLAG};

/// Title used when the page did not expose one
pub const UNKNOWN_TITLE: &str = "Video Title Not Found";

/// Hosts whose `/watch` pages carry a `v` query parameter
const WATCH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VideoIdError {
    #[error("video id is empty")]
    Empty,
    #[error("video id '{0}' contains characters outside [A-Za-z0-9_-]")]
    Malformed(String),
    #[error("video id '{0}' is a reserved engine flag")]
    Reserved(String),
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

/// Identifier of a video as used by the engine's per-video cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: &str) -> Result<Self, VideoIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VideoIdError::Empty);
        }
        if !id_pattern().is_match(raw) {
            return Err(VideoIdError::Malformed(raw.to_string()));
        }
        // Ids may start with '-', but never equal a token the engine reads as a flag
        if raw == ALL_FLAG || raw == CLEAR_CACHE_FLAG {
            return Err(VideoIdError::Reserved(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Extract the `v` parameter from a YouTube watch URL.
    /// Returns `None` for anything that is not a watch page with a usable id.
    pub fn from_watch_url(raw_url: &str) -> Option<Self> {
        let parsed = url::Url::parse(raw_url).ok()?;
        let host = parsed.host_str()?;
        if !WATCH_HOSTS.contains(&host) || parsed.path() != "/watch" {
            return None;
        }
        let v = parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?;
        Self::parse(&v).ok()
    }

    /// Accept either a bare id or a watch URL
    pub fn from_id_or_url(raw: &str) -> Result<Self, VideoIdError> {
        if raw.contains("://") {
            return Self::from_watch_url(raw).ok_or_else(|| VideoIdError::Malformed(raw.to_string()));
        }
        Self::parse(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = VideoIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

impl std::str::FromStr for VideoId {
    type Err = VideoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The subject of a question. Replaced wholesale when the active video changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContext {
    pub video_id: VideoId,
    pub title: String,
    pub url: String,
}

impl VideoContext {
    pub fn new(video_id: VideoId, title: Option<String>, url: Option<String>) -> Self {
        let url = url.unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", video_id));
        Self {
            video_id,
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            url,
        }
    }
}
