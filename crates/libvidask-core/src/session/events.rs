//! Session events, invalidations, and the browser-facing wire form

use serde::{Deserialize, Serialize};

use crate::error::VidaskError;
use crate::types::{ClearTarget, VideoId};

/// Lifecycle notification consumed by the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A video page finished loading (or a question was asked about it)
    VideoDetected(VideoId),
    /// The tracked tab went away with its window
    TrackedTabClosed,
    /// The extension is being unloaded
    ExtensionSuspending,
    /// A video page is navigating away
    PageUnloaded(VideoId),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::VideoDetected(_) => "VideoDetected",
            SessionEvent::TrackedTabClosed => "TrackedTabClosed",
            SessionEvent::ExtensionSuspending => "ExtensionSuspending",
            SessionEvent::PageUnloaded(_) => "PageUnloaded",
        }
    }
}

/// Cache invalidation emitted by a tracker transition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Invalidation {
    Video(VideoId),
    All,
}

impl Invalidation {
    pub fn target(&self) -> ClearTarget {
        match self {
            Invalidation::Video(id) => ClearTarget::Video(id.clone()),
            Invalidation::All => ClearTarget::All,
        }
    }
}

impl std::fmt::Display for Invalidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invalidation::Video(id) => write!(f, "Invalidate({})", id),
            Invalidation::All => write!(f, "InvalidateAll"),
        }
    }
}

/// Browser lifecycle notification as posted by the extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserEvent {
    /// Content script saw a watch page load
    VideoLoaded {
        #[serde(rename = "videoId")]
        video_id: String,
        #[serde(rename = "videoTitle", default, skip_serializing_if = "Option::is_none")]
        video_title: Option<String>,
    },
    /// A tab changed url or load status
    TabUpdated {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    /// A tab was removed
    TabRemoved {
        #[serde(rename = "isWindowClosing", default)]
        is_window_closing: bool,
    },
    /// The extension is suspending
    Suspend,
    /// A watch page is unloading
    PageUnload {
        #[serde(rename = "videoId")]
        video_id: String,
    },
}

impl BrowserEvent {
    /// Translate into a tracker event.
    ///
    /// `Ok(None)` means the notification is irrelevant: a tab update that is
    /// not a completed watch page, or a single tab closed while its window
    /// stays open.
    pub fn to_session_event(&self) -> Result<Option<SessionEvent>, VidaskError> {
        let parse = |raw: &str| VideoId::parse(raw).map_err(|e| VidaskError::InvalidArgument(e.to_string()));
        let event = match self {
            BrowserEvent::VideoLoaded { video_id, .. } => Some(SessionEvent::VideoDetected(parse(video_id)?)),
            BrowserEvent::TabUpdated { url, status } => {
                if status.as_deref() != Some("complete") {
                    return Ok(None);
                }
                VideoId::from_watch_url(url).map(SessionEvent::VideoDetected)
            }
            BrowserEvent::TabRemoved { is_window_closing } => {
                is_window_closing.then_some(SessionEvent::TrackedTabClosed)
            }
            BrowserEvent::Suspend => Some(SessionEvent::ExtensionSuspending),
            BrowserEvent::PageUnload { video_id } => Some(SessionEvent::PageUnloaded(parse(video_id)?)),
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    fn decode(json: &str) -> BrowserEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_video_loaded() {
        let event = decode(r#"{"type":"video_loaded","videoId":"abc123","videoTitle":"A talk"}"#);
        assert_eq!(
            event.to_session_event().unwrap(),
            Some(SessionEvent::VideoDetected(id("abc123")))
        );
    }

    #[test]
    fn test_tab_updated_requires_complete_watch_page() {
        let complete = decode(
            r#"{"type":"tab_updated","url":"https://www.youtube.com/watch?v=xyz789","status":"complete"}"#,
        );
        assert_eq!(
            complete.to_session_event().unwrap(),
            Some(SessionEvent::VideoDetected(id("xyz789")))
        );

        let loading = decode(
            r#"{"type":"tab_updated","url":"https://www.youtube.com/watch?v=xyz789","status":"loading"}"#,
        );
        assert_eq!(loading.to_session_event().unwrap(), None);

        let elsewhere = decode(r#"{"type":"tab_updated","url":"https://example.com/","status":"complete"}"#);
        assert_eq!(elsewhere.to_session_event().unwrap(), None);
    }

    #[test]
    fn test_tab_removed_only_counts_window_close() {
        let closing = decode(r#"{"type":"tab_removed","isWindowClosing":true}"#);
        assert_eq!(closing.to_session_event().unwrap(), Some(SessionEvent::TrackedTabClosed));

        let single = decode(r#"{"type":"tab_removed","isWindowClosing":false}"#);
        assert_eq!(single.to_session_event().unwrap(), None);

        let missing_flag = decode(r#"{"type":"tab_removed"}"#);
        assert_eq!(missing_flag.to_session_event().unwrap(), None);
    }

    #[test]
    fn test_suspend_and_unload() {
        assert_eq!(
            decode(r#"{"type":"suspend"}"#).to_session_event().unwrap(),
            Some(SessionEvent::ExtensionSuspending)
        );
        assert_eq!(
            decode(r#"{"type":"page_unload","videoId":"abc123"}"#).to_session_event().unwrap(),
            Some(SessionEvent::PageUnloaded(id("abc123")))
        );
    }

    #[test]
    fn test_leading_dash_ids_are_tracked() {
        let complete = decode(
            r#"{"type":"tab_updated","url":"https://www.youtube.com/watch?v=-FIHqoTcZog","status":"complete"}"#,
        );
        assert_eq!(
            complete.to_session_event().unwrap(),
            Some(SessionEvent::VideoDetected(id("-FIHqoTcZog")))
        );

        let loaded = decode(r#"{"type":"video_loaded","videoId":"-FIHqoTcZog"}"#);
        assert_eq!(
            loaded.to_session_event().unwrap(),
            Some(SessionEvent::VideoDetected(id("-FIHqoTcZog")))
        );

        let unload = decode(r#"{"type":"page_unload","videoId":"-FIHqoTcZog"}"#);
        assert_eq!(
            unload.to_session_event().unwrap(),
            Some(SessionEvent::PageUnloaded(id("-FIHqoTcZog")))
        );
    }

    #[test]
    fn test_malformed_id_is_invalid_argument() {
        let event = decode(r#"{"type":"video_loaded","videoId":"--all"}"#);
        assert!(matches!(event.to_session_event(), Err(VidaskError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalidation_target() {
        assert_eq!(Invalidation::All.target(), ClearTarget::All);
        assert_eq!(
            Invalidation::Video(id("abc")).target(),
            ClearTarget::Video(id("abc"))
        );
        assert_eq!(Invalidation::Video(id("abc")).to_string(), "Invalidate(abc)");
    }
}
