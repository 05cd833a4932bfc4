use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("{operation}: required field '{field}' is missing or invalid")]
    PreconditionFailed {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Remote error from {url}: {status} {reason} - {body}")]
    Remote {
        url: String,
        status: u16,
        reason: String,
        body: Value,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Server-provided `message` of a remote error, if the body carried one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ApiError::Remote { body, .. } => body.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            ApiError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::Remote { status: 401, .. } => {
                Some("Verify your API key using: bugzilla-cli profile add")
            }
            ApiError::Remote { status: 404, .. } => Some("Check if the resource ID is correct"),
            ApiError::Remote { .. } => Some("Review the server message and request parameters"),
            ApiError::PreconditionFailed { .. } => {
                Some("Supply the field (attachment data must be ASCII text) and try again")
            }
            ApiError::InvalidUrl(_) => Some("Check the configured base URL"),
            ApiError::RequestFailed(_) => Some("Check your network connection or try again later"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_display_includes_body() {
        let err = ApiError::Remote {
            url: "https://bugzilla.example.com/rest/bug/1".to_string(),
            status: 200,
            reason: "OK".to_string(),
            body: json!({"error": true, "message": "bad id"}),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("bad id"));
        assert!(rendered.contains("200 OK"));
        assert_eq!(err.remote_message(), Some("bad id"));
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_precondition_display() {
        let err = ApiError::PreconditionFailed {
            operation: "post_bug",
            field: "summary",
        };
        assert_eq!(
            err.to_string(),
            "post_bug: required field 'summary' is missing or invalid"
        );
        assert!(err.remote_message().is_none());
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_suggestion_by_status() {
        let unauthorized = ApiError::Remote {
            url: String::new(),
            status: 401,
            reason: "Unauthorized".to_string(),
            body: json!({}),
        };
        assert!(unauthorized.suggestion().unwrap().contains("API key"));

        assert!(ApiError::KeyNotFound("id".to_string()).suggestion().is_none());
    }
}
