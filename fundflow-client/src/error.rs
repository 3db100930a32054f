//! Error types for the Fundflow client

use fundflow_core::dto::permission::ValidationErrorBody;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// A single validation message, optionally tied to a request field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

/// Errors that can occur when using the Fundflow client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The current user may not perform this request
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Backend rejected the request content
    #[error("Validation failed: {}", join_messages(.0))]
    ValidationFailed(Vec<FieldError>),

    /// Backend reported that nothing changed (HTTP 304)
    #[error("Not modified")]
    NotModified,

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{}: {}", field, e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Map a non-success status and its body to an error
    pub fn classify(status: u16, body: String) -> Self {
        match status {
            304 => Self::NotModified,
            400 => Self::ValidationFailed(parse_field_errors(&body)),
            403 => Self::Forbidden(if body.is_empty() {
                "Forbidden".to_string()
            } else {
                body
            }),
            404 => Self::NotFound(body),
            _ => Self::api_error(status, body),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed(_)) || self.is_server_error()
    }
}

/// Parses a 400 body into field errors, falling back to the raw text
fn parse_field_errors(body: &str) -> Vec<FieldError> {
    let parsed = serde_json::from_str::<ValidationErrorBody>(body)
        .ok()
        .filter(|b| !b.errors.is_empty());

    match parsed {
        Some(body) => body
            .errors
            .into_iter()
            .flat_map(|(field, messages)| {
                messages.into_iter().map(move |message| FieldError {
                    field: Some(field.clone()),
                    message,
                })
            })
            .collect(),
        None => vec![FieldError {
            field: None,
            message: if body.is_empty() {
                "Request was rejected".to_string()
            } else {
                body.to_string()
            },
        }],
    }
}
