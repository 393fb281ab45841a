use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of every failure a caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing credential or unusable configuration; never reaches the engine
    Configuration,
    /// Malformed inbound request; never reaches the engine
    InvalidArgument,
    /// The OS could not start the engine process
    LaunchFailure,
    /// The engine ran and exited non-zero
    EngineFailure,
    /// The engine did not finish within the configured bound
    Timeout,
    /// Transport failure between the UI bridge and the backend
    NetworkFailure,
}

impl ErrorKind {
    /// Wire code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::LaunchFailure => "launch_failure",
            ErrorKind::EngineFailure => "engine_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkFailure => "network_failure",
        }
    }

    /// Parse a wire code. Unknown codes are treated as engine failures.
    pub fn from_code(code: &str) -> Self {
        match code {
            "configuration" => ErrorKind::Configuration,
            "invalid_argument" => ErrorKind::InvalidArgument,
            "launch_failure" => ErrorKind::LaunchFailure,
            "timeout" => ErrorKind::Timeout,
            "network_failure" => ErrorKind::NetworkFailure,
            _ => ErrorKind::EngineFailure,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Main error type for vidask operations
#[derive(Debug, Error)]
pub enum VidaskError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to start engine: {0}")]
    LaunchFailure(String),

    #[error("engine failed: {0}")]
    EngineFailure(String),

    #[error("engine timed out after {0}ms")]
    Timeout(u64),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of a single engine request: the trimmed answer text, or a typed failure
pub type EngineResult = Result<String, VidaskError>;

impl VidaskError {
    /// Build an error of the given kind carrying `message` verbatim
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Configuration => VidaskError::Configuration(message),
            ErrorKind::InvalidArgument => VidaskError::InvalidArgument(message),
            ErrorKind::LaunchFailure => VidaskError::LaunchFailure(message),
            ErrorKind::EngineFailure => VidaskError::EngineFailure(message),
            ErrorKind::Timeout => {
                let digits: String = message.chars().filter(|c| c.is_ascii_digit()).collect();
                VidaskError::Timeout(digits.parse().unwrap_or(0))
            }
            ErrorKind::NetworkFailure => VidaskError::NetworkFailure(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VidaskError::Configuration(_) => ErrorKind::Configuration,
            VidaskError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            VidaskError::LaunchFailure(_) => ErrorKind::LaunchFailure,
            VidaskError::EngineFailure(_) => ErrorKind::EngineFailure,
            VidaskError::Timeout(_) => ErrorKind::Timeout,
            VidaskError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            VidaskError::Io(_) => ErrorKind::Configuration,
            VidaskError::TomlParse(_) => ErrorKind::Configuration,
            VidaskError::Json(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        self.kind().code()
    }

    /// The raw payload without the display prefix.
    /// For engine failures this is exactly the captured stderr.
    pub fn message(&self) -> String {
        match self {
            VidaskError::Configuration(m)
            | VidaskError::InvalidArgument(m)
            | VidaskError::LaunchFailure(m)
            | VidaskError::EngineFailure(m)
            | VidaskError::NetworkFailure(m) => m.clone(),
            VidaskError::Timeout(ms) => format!("engine did not finish within {}ms", ms),
            VidaskError::Io(e) => e.to_string(),
            VidaskError::TomlParse(e) => e.to_string(),
            VidaskError::Json(e) => e.to_string(),
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidArgument => 2,
            ErrorKind::Configuration => 3,
            ErrorKind::NetworkFailure => 4,
            ErrorKind::LaunchFailure | ErrorKind::EngineFailure => 5,
            ErrorKind::Timeout => 6,
        }
    }

    /// Whether a repeated attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::LaunchFailure | ErrorKind::EngineFailure | ErrorKind::Timeout | ErrorKind::NetworkFailure
        )
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self.kind() {
            ErrorKind::Configuration => vec![
                "Set GOOGLE_API_KEY (or the configured credential variable) in the daemon's environment",
                "Check the file passed to 'vidask-daemon --config'",
            ],
            ErrorKind::NetworkFailure => vec![
                "Start the backend with 'vidask-daemon'",
                "Or point the client at it with '--server <url>'",
            ],
            ErrorKind::LaunchFailure => vec![
                "Check engine.program and engine.args in the daemon configuration",
                "Make sure the engine's virtualenv exists and is executable",
            ],
            ErrorKind::Timeout => vec![
                "Raise engine.timeout_ms if long videos take a while to index",
            ],
            ErrorKind::InvalidArgument | ErrorKind::EngineFailure => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_kind() {
        for kind in [
            ErrorKind::Configuration,
            ErrorKind::InvalidArgument,
            ErrorKind::LaunchFailure,
            ErrorKind::EngineFailure,
            ErrorKind::Timeout,
            ErrorKind::NetworkFailure,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn test_unknown_code_is_engine_failure() {
        assert_eq!(ErrorKind::from_code("internal"), ErrorKind::EngineFailure);
    }

    #[test]
    fn test_engine_failure_message_is_raw_stderr() {
        let err = VidaskError::EngineFailure("index not found".to_string());
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert_eq!(err.message(), "index not found");
        assert_eq!(err.to_string(), "engine failed: index not found");
    }

    #[test]
    fn test_from_kind_keeps_message() {
        let err = VidaskError::from_kind(ErrorKind::LaunchFailure, "No such file or directory");
        assert!(matches!(err, VidaskError::LaunchFailure(ref m) if m == "No such file or directory"));
    }

    #[test]
    fn test_exit_codes_and_transience() {
        assert_eq!(VidaskError::InvalidArgument("x".into()).exit_code(), 2);
        assert_eq!(VidaskError::NetworkFailure("x".into()).exit_code(), 4);
        assert!(VidaskError::Timeout(10).is_transient());
        assert!(!VidaskError::Configuration("x".into()).is_transient());
        assert!(!VidaskError::InvalidArgument("x".into()).is_transient());
    }
}
