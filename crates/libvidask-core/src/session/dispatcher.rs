//! Cache invalidation dispatcher
//!
//! Turns tracker invalidations into clear requests. Every clear runs in its
//! own task; its outcome is logged and counted, never handed back to the
//! event source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::events::Invalidation;
use crate::config::InvalidationConfig;
use crate::router::RequestRouter;

/// Outcome counters for invalidation requests
#[derive(Debug, Default)]
pub struct DispatchStats {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCounters {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl DispatchStats {
    pub fn counters(&self) -> DispatchCounters {
        DispatchCounters {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct InvalidationDispatcher {
    router: RequestRouter,
    policy: InvalidationConfig,
    stats: Arc<DispatchStats>,
}

impl InvalidationDispatcher {
    pub fn new(router: RequestRouter, policy: InvalidationConfig) -> Self {
        Self {
            router,
            policy,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        self.stats.clone()
    }

    /// Consume invalidations until the sending side closes, then wait a
    /// bounded time for clears still in flight.
    pub fn spawn(self, rx: mpsc::UnboundedReceiver<Invalidation>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<Invalidation>) {
        debug!("Invalidation dispatcher started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(invalidation) => {
                        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
                        in_flight.spawn(dispatch_one(
                            self.router.clone(),
                            invalidation,
                            self.policy.clone(),
                            self.stats.clone(),
                        ));
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Invalidation task panicked: {}", e);
                    }
                }
            }
        }

        let pending = in_flight.len();
        if pending > 0 {
            debug!(pending, "Waiting for in-flight invalidations");
            let drain = Duration::from_millis(self.policy.drain_timeout_ms);
            let drained = tokio::time::timeout(drain, async {
                while in_flight.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                warn!(remaining = in_flight.len(), "Abandoning invalidations still in flight at shutdown");
                in_flight.abort_all();
            }
        }

        debug!("Invalidation dispatcher stopped");
    }
}

/// Run one invalidation with the configured retry budget
async fn dispatch_one(
    router: RequestRouter,
    invalidation: Invalidation,
    policy: InvalidationConfig,
    stats: Arc<DispatchStats>,
) {
    let target = invalidation.target();
    let attempts = policy.retries.saturating_add(1);

    for attempt in 1..=attempts {
        match router.clear(&target).await {
            Ok(response) => {
                info!(%invalidation, attempt, response = %response, "Cache clear completed");
                stats.succeeded.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Err(e) if attempt < attempts && e.is_transient() => {
                warn!(%invalidation, attempt, kind = %e.kind(), "Cache clear failed, retrying: {}", e);
                tokio::time::sleep(Duration::from_millis(policy.retry_delay_ms)).await;
            }
            Err(e) => {
                warn!(%invalidation, attempt, kind = %e.kind(), "Cache clear failed: {}", e);
                stats.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::RecordingEngine;
    use crate::types::{ClearTarget, VideoId};

    fn id(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    fn policy(retries: u32) -> InvalidationConfig {
        InvalidationConfig {
            retries,
            retry_delay_ms: 1,
            drain_timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn test_each_invalidation_becomes_one_clear() {
        let engine = Arc::new(RecordingEngine::answering("Cache cleared"));
        let dispatcher = InvalidationDispatcher::new(RequestRouter::new(engine.clone()), policy(0));
        let stats = dispatcher.stats();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = dispatcher.spawn(rx);

        tx.send(Invalidation::Video(id("abc123"))).unwrap();
        tx.send(Invalidation::All).unwrap();
        drop(tx);
        task.await.unwrap();

        let mut targets = engine.clear_targets();
        targets.sort_by_key(|t| t.to_string());
        assert_eq!(targets, vec![ClearTarget::All, ClearTarget::Video(id("abc123"))]);
        assert_eq!(
            stats.counters(),
            DispatchCounters {
                dispatched: 2,
                succeeded: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_retried_by_default() {
        let engine = Arc::new(RecordingEngine::failing(ErrorKind::EngineFailure, "boom"));
        let dispatcher = InvalidationDispatcher::new(RequestRouter::new(engine.clone()), policy(0));
        let stats = dispatcher.stats();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = dispatcher.spawn(rx);

        tx.send(Invalidation::Video(id("abc123"))).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(engine.call_count(), 1);
        assert_eq!(stats.counters().failed, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_use_retry_budget() {
        let engine = Arc::new(RecordingEngine::failing(ErrorKind::Timeout, "120000"));
        let dispatcher = InvalidationDispatcher::new(RequestRouter::new(engine.clone()), policy(2));
        let (tx, rx) = mpsc::unbounded_channel();
        let task = dispatcher.spawn(rx);

        tx.send(Invalidation::All).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn test_configuration_errors_are_never_retried() {
        let engine = Arc::new(RecordingEngine::failing(ErrorKind::Configuration, "no key"));
        let dispatcher = InvalidationDispatcher::new(RequestRouter::new(engine.clone()), policy(5));
        let (tx, rx) = mpsc::unbounded_channel();
        let task = dispatcher.spawn(rx);

        tx.send(Invalidation::All).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clears_run_concurrently() {
        let engine = Arc::new(RecordingEngine::answering("ok").with_delay(Duration::from_millis(200)));
        let dispatcher = InvalidationDispatcher::new(RequestRouter::new(engine.clone()), policy(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let _task = dispatcher.spawn(rx);

        tx.send(Invalidation::Video(id("a"))).unwrap();
        tx.send(Invalidation::Video(id("b"))).unwrap();
        tx.send(Invalidation::Video(id("c"))).unwrap();

        // All three reach the engine before the first one finishes
        assert!(engine.wait_for_calls(3, Duration::from_millis(150)).await);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_slow_clears_after_drain_timeout() {
        let engine = Arc::new(RecordingEngine::answering("ok").with_delay(Duration::from_secs(30)));
        let mut slow_policy = policy(0);
        slow_policy.drain_timeout_ms = 50;
        let dispatcher = InvalidationDispatcher::new(RequestRouter::new(engine.clone()), slow_policy);
        let stats = dispatcher.stats();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = dispatcher.spawn(rx);

        tx.send(Invalidation::All).unwrap();
        assert!(engine.wait_for_calls(1, Duration::from_secs(1)).await);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("dispatcher should stop after drain timeout")
            .unwrap();
        assert_eq!(stats.counters().succeeded, 0);
    }
}
