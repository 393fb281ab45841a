//! HTTP request and response bodies
//!
//! Request bodies are the core payload types (`AskPayload`,
//! `ClearCachePayload`, `BrowserEvent`). Responses are either
//! `{ "response": ... }` or `{ "error": ..., "details"?: ..., "code": ... }`.

use libvidask_core::session::{DispatchCounters, SessionSnapshot};
use libvidask_core::{ErrorKind, VidaskError};
use serde::{Deserialize, Serialize};

/// Successful ask / clear-cache response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub response: String,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable summary
    pub error: String,
    /// Raw diagnostics, e.g. the engine's stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Error kind code (see `ErrorKind::code`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn from_error(err: &VidaskError) -> Self {
        let kind = err.kind();
        let (error, details) = match kind {
            ErrorKind::EngineFailure => ("RAG engine failed.".to_string(), Some(err.message())),
            ErrorKind::LaunchFailure => (
                "Failed to start RAG engine process.".to_string(),
                Some(err.message()),
            ),
            ErrorKind::Timeout => ("RAG engine timed out.".to_string(), Some(err.message())),
            ErrorKind::Configuration | ErrorKind::InvalidArgument | ErrorKind::NetworkFailure => {
                (err.message(), None)
            }
        };
        Self {
            error,
            details,
            code: Some(kind.code().to_string()),
        }
    }

    /// Error kind, falling back to the HTTP status when no code was sent
    pub fn kind(&self, status: u16) -> ErrorKind {
        match self.code.as_deref() {
            Some(code) => ErrorKind::from_code(code),
            None if (400..500).contains(&status) => ErrorKind::InvalidArgument,
            None if status == 504 => ErrorKind::Timeout,
            None => ErrorKind::EngineFailure,
        }
    }

    /// Rebuild the typed error on the client side
    pub fn into_error(self, status: u16) -> VidaskError {
        let kind = self.kind(status);
        let message = match (kind, self.details) {
            (ErrorKind::Configuration | ErrorKind::InvalidArgument, _) => self.error,
            (_, Some(details)) if !details.is_empty() => details,
            (_, _) => self.error,
        };
        VidaskError::from_kind(kind, message)
    }
}

/// Response to a posted browser event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAccepted {
    pub accepted: bool,
    /// Name of the tracker event the notification mapped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// Tracker state plus invalidation counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session: SessionSnapshot,
    pub invalidations: DispatchCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub credential_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_body_carries_stderr() {
        let body = ErrorBody::from_error(&VidaskError::EngineFailure("index not found".to_string()));
        assert_eq!(body.error, "RAG engine failed.");
        assert_eq!(body.details.as_deref(), Some("index not found"));
        assert_eq!(body.code.as_deref(), Some("engine_failure"));

        let err = body.into_error(500);
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert_eq!(err.message(), "index not found");
    }

    #[test]
    fn test_validation_body_has_no_details() {
        let body = ErrorBody::from_error(&VidaskError::InvalidArgument("Query is required.".to_string()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Query is required.", "code": "invalid_argument"})
        );
    }

    #[test]
    fn test_legacy_body_without_code_uses_status() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Query is required."}"#).unwrap();
        assert_eq!(body.kind(400), ErrorKind::InvalidArgument);

        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Python script failed.","details":"Traceback"}"#).unwrap();
        let err = body.into_error(500);
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert_eq!(err.message(), "Traceback");
    }

    #[test]
    fn test_timeout_round_trip() {
        let body = ErrorBody::from_error(&VidaskError::Timeout(1500));
        match body.into_error(504) {
            VidaskError::Timeout(ms) => assert_eq!(ms, 1500),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
