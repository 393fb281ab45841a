//! Supervisor module - wires the session pipeline to the HTTP surface
//!
//! The supervisor:
//! - Builds the engine gateway and request router
//! - Starts the invalidation dispatcher and session tracker tasks
//! - Serves HTTP until the shutdown future resolves
//! - Stops the tracker, then lets the dispatcher drain in-flight clears

use std::future::Future;
use std::sync::Arc;

use libvidask_core::session::{spawn_tracker, InvalidationDispatcher, VideoSessionTracker};
use libvidask_core::{Config, ProcessGateway, RagEngine, RequestRouter};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::DaemonError;
use crate::server::{self, AppState};

/// Tracker inbox size
const TRACKER_CAPACITY: usize = 256;

pub struct Supervisor {
    config: Config,
    engine: Arc<dyn RagEngine>,
}

impl Supervisor {
    /// Create a supervisor backed by the external engine process
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(ProcessGateway::new(&config));
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: Config, engine: Arc<dyn RagEngine>) -> Self {
        Self { config, engine }
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<(), DaemonError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.server.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| DaemonError::BindFailed { addr: addr.clone(), source })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), DaemonError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;

        let router = RequestRouter::new(self.engine);
        let dispatcher = InvalidationDispatcher::new(router.clone(), self.config.invalidation.clone());
        let stats = dispatcher.stats();

        let (invalidation_tx, invalidation_rx) = mpsc::unbounded_channel();
        let dispatcher_task = dispatcher.spawn(invalidation_rx);
        let (tracker, tracker_task) = spawn_tracker(VideoSessionTracker::new(), invalidation_tx, TRACKER_CAPACITY);

        let state = AppState {
            router,
            tracker: tracker.clone(),
            stats,
            credential_configured: self.config.credential.is_some(),
        };
        let app = server::app(state, self.config.server.cors_origins.clone());

        info!(%local_addr, engine = %self.config.engine.program.display(), "Listening");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DaemonError::Server(e.to_string()));

        debug!("HTTP server stopped, shutting down session pipeline");
        tracker.shutdown().await;
        if let Err(e) = tracker_task.await {
            error!("Session tracker task failed: {}", e);
        }
        if let Err(e) = dispatcher_task.await {
            error!("Invalidation dispatcher task failed: {}", e);
        }

        served
    }
}
