//! Active-video tracking and cache invalidation
//!
//! Lifecycle events flow tracker -> dispatcher -> router -> engine. The
//! tracker is the only writer of the active-video slot.

pub mod dispatcher;
pub mod events;
pub mod tracker;

pub use dispatcher::{DispatchCounters, DispatchStats, InvalidationDispatcher};
pub use events::{BrowserEvent, Invalidation, SessionEvent};
pub use tracker::{spawn_tracker, SessionSnapshot, TrackerClosed, TrackerHandle, VideoSessionTracker};
