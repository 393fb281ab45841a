//! Video session tracker
//!
//! Owns the single active-video slot. Transitions are applied one message at
//! a time by a dedicated task, so no locking is needed and events from one
//! source keep their order. Each transition emits at most one invalidation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{Invalidation, SessionEvent};
use crate::types::VideoId;

/// Read-only view of the tracker state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_video_id: Option<VideoId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub invalidations_emitted: u64,
}

/// The active-video state machine
#[derive(Debug, Default)]
pub struct VideoSessionTracker {
    current: Option<VideoId>,
    updated_at: Option<DateTime<Utc>>,
    invalidations_emitted: u64,
}

impl VideoSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&VideoId> {
        self.current.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_video_id: self.current.clone(),
            updated_at: self.updated_at,
            invalidations_emitted: self.invalidations_emitted,
        }
    }

    /// Apply one event, returning the invalidation it requires (if any)
    pub fn apply(&mut self, event: SessionEvent) -> Option<Invalidation> {
        let invalidation = match event {
            SessionEvent::VideoDetected(id) => match self.current.take() {
                None => {
                    info!(video_id = %id, "New video loaded");
                    self.set_current(Some(id));
                    None
                }
                Some(previous) if previous == id => {
                    self.current = Some(previous);
                    return None;
                }
                Some(previous) => {
                    info!(from = %previous, to = %id, "Video changed, clearing cache for old video");
                    self.set_current(Some(id));
                    Some(Invalidation::Video(previous))
                }
            },
            SessionEvent::TrackedTabClosed => {
                let previous = self.current.take()?;
                info!(video_id = %previous, "Tracked tab closed, clearing its cache");
                self.set_current(None);
                Some(Invalidation::Video(previous))
            }
            SessionEvent::ExtensionSuspending => {
                info!(previous = ?self.current, "Extension suspending, clearing all caches");
                self.set_current(None);
                Some(Invalidation::All)
            }
            SessionEvent::PageUnloaded(id) => {
                if self.current.as_ref() != Some(&id) {
                    debug!(video_id = %id, current = ?self.current, "Unload for untracked video ignored");
                    return None;
                }
                info!(video_id = %id, "Navigating away from video, clearing its cache");
                self.set_current(None);
                Some(Invalidation::Video(id))
            }
        };

        if invalidation.is_some() {
            self.invalidations_emitted += 1;
        }
        invalidation
    }

    fn set_current(&mut self, id: Option<VideoId>) {
        self.current = id;
        self.updated_at = Some(Utc::now());
    }
}

/// Message sent to the tracker task
pub enum TrackerMessage {
    /// Apply a lifecycle event
    Event(SessionEvent),
    /// Report the current state
    Snapshot(oneshot::Sender<SessionSnapshot>),
    /// Stop the tracker
    Shutdown,
}

#[derive(Debug, Error)]
#[error("session tracker is not running")]
pub struct TrackerClosed;

/// Cloneable handle used by event sources to reach the tracker task
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerMessage>,
}

impl TrackerHandle {
    /// Queue an event. Returns once the event is queued, not applied.
    pub async fn notify(&self, event: SessionEvent) -> Result<(), TrackerClosed> {
        self.tx
            .send(TrackerMessage::Event(event))
            .await
            .map_err(|_| TrackerClosed)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, TrackerClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerMessage::Snapshot(reply_tx))
            .await
            .map_err(|_| TrackerClosed)?;
        reply_rx.await.map_err(|_| TrackerClosed)
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(TrackerMessage::Shutdown).await;
    }
}

/// Start the tracker task. Invalidations are pushed to `invalidations`
/// without waiting for anyone to act on them.
pub fn spawn_tracker(
    tracker: VideoSessionTracker,
    invalidations: mpsc::UnboundedSender<Invalidation>,
    capacity: usize,
) -> (TrackerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let task = tokio::spawn(run_tracker(tracker, rx, invalidations));
    (TrackerHandle { tx }, task)
}

async fn run_tracker(
    mut tracker: VideoSessionTracker,
    mut rx: mpsc::Receiver<TrackerMessage>,
    invalidations: mpsc::UnboundedSender<Invalidation>,
) {
    debug!("Session tracker started");

    while let Some(msg) = rx.recv().await {
        match msg {
            TrackerMessage::Event(event) => {
                let name = event.name();
                if let Some(invalidation) = tracker.apply(event) {
                    debug!(event = name, %invalidation, "Emitting invalidation");
                    if invalidations.send(invalidation).is_err() {
                        warn!(event = name, "Invalidation dispatcher is gone, dropping invalidation");
                    }
                }
            }
            TrackerMessage::Snapshot(reply) => {
                let _ = reply.send(tracker.snapshot());
            }
            TrackerMessage::Shutdown => {
                debug!("Session tracker shutdown requested");
                break;
            }
        }
    }

    debug!("Session tracker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    fn detected(raw: &str) -> SessionEvent {
        SessionEvent::VideoDetected(id(raw))
    }

    #[test]
    fn test_first_detection_sets_without_invalidation() {
        let mut tracker = VideoSessionTracker::new();
        assert_eq!(tracker.apply(detected("abc123")), None);
        assert_eq!(tracker.current(), Some(&id("abc123")));
        assert_eq!(tracker.snapshot().invalidations_emitted, 0);
    }

    #[test]
    fn test_switching_video_invalidates_previous_once() {
        let mut tracker = VideoSessionTracker::new();
        tracker.apply(detected("abc123"));

        let emitted = tracker.apply(detected("xyz789"));

        assert_eq!(emitted, Some(Invalidation::Video(id("abc123"))));
        assert_eq!(tracker.current(), Some(&id("xyz789")));
        assert_eq!(tracker.snapshot().invalidations_emitted, 1);
    }

    #[test]
    fn test_duplicate_detection_is_noop() {
        let mut tracker = VideoSessionTracker::new();
        tracker.apply(detected("abc123"));
        let before = tracker.snapshot();

        assert_eq!(tracker.apply(detected("abc123")), None);
        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn test_tab_close_invalidates_and_resets() {
        let mut tracker = VideoSessionTracker::new();
        tracker.apply(detected("abc123"));

        assert_eq!(
            tracker.apply(SessionEvent::TrackedTabClosed),
            Some(Invalidation::Video(id("abc123")))
        );
        assert_eq!(tracker.current(), None);

        // Nothing tracked, nothing to clear
        assert_eq!(tracker.apply(SessionEvent::TrackedTabClosed), None);
    }

    #[test]
    fn test_suspend_always_sweeps() {
        let mut tracker = VideoSessionTracker::new();
        assert_eq!(tracker.apply(SessionEvent::ExtensionSuspending), Some(Invalidation::All));
        assert_eq!(tracker.current(), None);

        tracker.apply(detected("abc123"));
        assert_eq!(tracker.apply(SessionEvent::ExtensionSuspending), Some(Invalidation::All));
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.snapshot().invalidations_emitted, 2);
    }

    #[test]
    fn test_page_unload_only_for_current_video() {
        let mut tracker = VideoSessionTracker::new();
        tracker.apply(detected("abc123"));

        assert_eq!(tracker.apply(SessionEvent::PageUnloaded(id("other"))), None);
        assert_eq!(tracker.current(), Some(&id("abc123")));

        assert_eq!(
            tracker.apply(SessionEvent::PageUnloaded(id("abc123"))),
            Some(Invalidation::Video(id("abc123")))
        );
        assert_eq!(tracker.current(), None);

        // The next page load after an unload does not clear the same video twice
        assert_eq!(tracker.apply(detected("xyz789")), None);
    }

    #[test]
    fn test_every_invalidation_names_a_previously_active_video() {
        let events = vec![
            detected("a"),
            detected("b"),
            detected("b"),
            SessionEvent::PageUnloaded(id("a")),
            SessionEvent::TrackedTabClosed,
            SessionEvent::TrackedTabClosed,
            detected("c"),
            SessionEvent::ExtensionSuspending,
            detected("d"),
            SessionEvent::PageUnloaded(id("d")),
        ];

        let mut tracker = VideoSessionTracker::new();
        let mut seen = Vec::new();
        let mut emitted = Vec::new();
        for event in events {
            if let Some(current) = tracker.current() {
                seen.push(current.clone());
            }
            if let Some(inv) = tracker.apply(event) {
                emitted.push(inv);
            }
        }

        assert_eq!(
            emitted,
            vec![
                Invalidation::Video(id("a")),
                Invalidation::Video(id("b")),
                Invalidation::All,
                Invalidation::Video(id("d")),
            ]
        );
        for inv in &emitted {
            if let Invalidation::Video(v) = inv {
                assert!(seen.contains(v));
            }
        }
    }

    #[tokio::test]
    async fn test_tracker_task_preserves_order() {
        let (inv_tx, mut inv_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_tracker(VideoSessionTracker::new(), inv_tx, 16);

        handle.notify(detected("abc123")).await.unwrap();
        handle.notify(detected("xyz789")).await.unwrap();
        handle.notify(detected("xyz789")).await.unwrap();
        handle.notify(SessionEvent::ExtensionSuspending).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_video_id, None);
        assert_eq!(snapshot.invalidations_emitted, 2);

        assert_eq!(inv_rx.recv().await, Some(Invalidation::Video(id("abc123"))));
        assert_eq!(inv_rx.recv().await, Some(Invalidation::All));

        handle.shutdown().await;
        task.await.unwrap();
        assert!(handle.notify(SessionEvent::TrackedTabClosed).await.is_err());

        // Tracker dropped its sender on exit
        assert_eq!(inv_rx.recv().await, None);
    }
}
