//! Client-side error types

use libvidask_core::VidaskError;
use thiserror::Error;

use crate::messages::ErrorBody;

/// Errors that can occur while talking to the daemon
#[derive(Error, Debug)]
pub enum ApiError {
    /// The configured server URL cannot be used
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// No response received (connection refused, reset, DNS...)
    #[error("Could not reach the vidask backend at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// No response within the client timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// The daemon answered with an error body
    #[error("Backend error [{status}]: {}", .body.error)]
    Server { status: u16, body: ErrorBody },

    /// The daemon answered with something that is not a known body
    #[error("Unexpected response [{status}]: {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// True when the failure happened before any response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. } | ApiError::Timeout(_))
    }
}

impl From<ApiError> for VidaskError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Server { status, body } => body.into_error(status),
            ApiError::Json(e) => VidaskError::Json(e),
            other => VidaskError::NetworkFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libvidask_core::ErrorKind;

    #[test]
    fn test_transport_errors_become_network_failures() {
        let err = ApiError::Unreachable {
            url: "http://localhost:3000".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.is_transport());
        let err: VidaskError = err.into();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn test_server_errors_keep_their_kind() {
        let err = ApiError::Server {
            status: 500,
            body: ErrorBody {
                error: "Failed to start RAG engine process.".to_string(),
                details: Some("No such file or directory".to_string()),
                code: Some("launch_failure".to_string()),
            },
        };
        assert!(!err.is_transport());
        let err: VidaskError = err.into();
        assert_eq!(err.kind(), ErrorKind::LaunchFailure);
        assert_eq!(err.message(), "No such file or directory");
    }
}
