//! HTTP types and client for vidask daemon communication
//!
//! This crate provides:
//! - Response bodies shared by the daemon and its clients
//! - The route table
//! - An async client used by the `vidask` CLI

pub mod client;
pub mod error;
pub mod messages;

pub use client::ApiClient;
pub use error::ApiError;
pub use messages::{AnswerResponse, ErrorBody, EventAccepted, HealthResponse, SessionStatus};

pub const ASK_PATH: &str = "/api/ask-rag";
pub const CLEAR_CACHE_PATH: &str = "/api/clear-cache";
pub const EVENTS_PATH: &str = "/api/events";
pub const SESSION_PATH: &str = "/api/session";
pub const HEALTH_PATH: &str = "/health";

/// Default daemon address, as used by the browser extension
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Default request timeout in milliseconds. Longer than the engine's own
/// default bound so engine timeouts are reported by the daemon.
pub const DEFAULT_TIMEOUT_MS: u64 = 180_000;
