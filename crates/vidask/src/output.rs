use libvidask_core::{ErrorKind, VidaskError};
use serde::Serialize;

use crate::cli::Cli;

/// JSON response envelope
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub schema_version: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Serialize)]
pub struct JsonError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{}\"}}", e))
}

/// Output a successful result (JSON mode only)
pub fn output_success<T: Serialize>(cli: &Cli, data: T) {
    if cli.json {
        let response = JsonResponse {
            schema_version: 1,
            ok: true,
            data: Some(data),
            error: None,
        };
        println!("{}", to_pretty(&response));
    }
}

/// Human phrasing of an error. Transport failures keep the client's own text.
pub fn describe(err: &VidaskError) -> String {
    match err.kind() {
        ErrorKind::NetworkFailure => err.message(),
        ErrorKind::EngineFailure | ErrorKind::LaunchFailure => {
            format!("The engine reported an error: {}", err.message())
        }
        ErrorKind::Timeout => format!("The engine did not answer in time: {}", err.message()),
        ErrorKind::Configuration => format!("The backend is not configured: {}", err.message()),
        ErrorKind::InvalidArgument => err.message(),
    }
}

/// Output an error
pub fn output_error(cli: &Cli, err: &VidaskError) {
    if cli.json {
        let suggestions = err.suggestions();
        let details = if suggestions.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::json!({ "suggestions": suggestions })
        };

        let response: JsonResponse<()> = JsonResponse {
            schema_version: 1,
            ok: false,
            data: None,
            error: Some(JsonError {
                code: err.error_code().to_string(),
                message: describe(err),
                details,
            }),
        };
        eprintln!("{}", to_pretty(&response));
    } else {
        eprintln!("error: {}", describe(err));
        let suggestions = err.suggestions();
        if !suggestions.is_empty() {
            eprintln!();
            eprintln!("Suggestions:");
            for suggestion in suggestions {
                eprintln!("  - {}", suggestion);
            }
        }
    }
}

/// Print a warning that does not fail the command
pub fn output_warning(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        eprintln!("warning: {}", msg);
    }
}

/// Print human-readable output (ignored in quiet mode)
pub fn print_human(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        println!("{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_separates_transport_from_engine() {
        let unreachable = VidaskError::NetworkFailure(
            "Could not reach the vidask backend at http://localhost:3000/api/ask-rag: connection refused".to_string(),
        );
        assert!(describe(&unreachable).starts_with("Could not reach the vidask backend"));

        let engine = VidaskError::EngineFailure("index not found".to_string());
        assert_eq!(describe(&engine), "The engine reported an error: index not found");

        let launch = VidaskError::LaunchFailure("No such file or directory".to_string());
        assert!(describe(&launch).starts_with("The engine reported an error"));
    }

    #[test]
    fn test_describe_validation_is_verbatim() {
        let err = VidaskError::InvalidArgument("Please enter a query.".to_string());
        assert_eq!(describe(&err), "Please enter a query.");
    }
}
