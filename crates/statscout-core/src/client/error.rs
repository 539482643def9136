use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error categories for backend requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Network failure while sending or while reading the body
    Transport,
    /// Response body could not be parsed
    Parse,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErrorKind::HttpStatus => write!(f, "http_status"),
            ClientErrorKind::Timeout => write!(f, "timeout"),
            ClientErrorKind::Transport => write!(f, "transport"),
            ClientErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the backend with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientError {
    /// Error category
    pub kind: ClientErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error.
    ///
    /// FastAPI reports failures as `{"detail": "..."}`; that text is preferred
    /// over the raw body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = (!body.is_empty()).then(|| body.to_string());
        let summary = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| extract_error_text(&json))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    "Unable to connect to service".to_string()
                } else {
                    body.trim().to_string()
                }
            });

        Self {
            kind: ClientErrorKind::HttpStatus,
            message: format!("API Error ({status}): {summary}"),
            details,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Parse, message)
    }
}

fn extract_error_text(json: &Value) -> Option<String> {
    if let Some(detail) = json.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }
    json.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ClientError {}

/// Result type for backend operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Maps a reqwest failure onto a [`ClientError`].
pub fn classify_reqwest_error(e: &reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ClientError::transport(format!("Connection failed: {e}"))
    } else if e.is_decode() {
        ClientError::parse(format!("Invalid response body: {e}"))
    } else {
        ClientError::transport(format!("Network error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_prefers_fastapi_detail() {
        let err = ClientError::http_status(500, r#"{"detail":"Sportradar Client not initialized"}"#);
        assert_eq!(err.kind, ClientErrorKind::HttpStatus);
        assert_eq!(
            err.message,
            "API Error (500): Sportradar Client not initialized"
        );
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status_plain_body() {
        let err = ClientError::http_status(502, "Bad Gateway");
        assert_eq!(err.message, "API Error (502): Bad Gateway");
        assert_eq!(err.details.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn test_http_status_empty_body() {
        let err = ClientError::http_status(503, "");
        assert_eq!(err.message, "API Error (503): Unable to connect to service");
        assert_eq!(err.details, None);
    }
}
