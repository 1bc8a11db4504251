use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl AppError {
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Provider {
            status,
            message: message.into(),
        }
    }

    /// Retryable means the same call may succeed if repeated: throttling,
    /// upstream 5xx, or a dropped/timed-out connection.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Provider { status, message } => match status {
                Some(429) => true,
                Some(code) if *code >= 500 => true,
                _ => is_transient_message(message),
            },
            AppError::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err
                        .status()
                        .map(|status| status.as_u16() == 429 || status.is_server_error())
                        .unwrap_or(false)
            }
            _ => false,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider {
                status: Some(code), ..
            } => StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::Http(err) => err
                .status()
                .and_then(|status| StatusCode::from_u16(status.as_u16()).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn is_transient_message(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("timed out")
        || lowered.contains("timeout")
        || lowered.contains("etimedout")
        || lowered.contains("connection reset")
        || lowered.contains("econnreset")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = Json(json!({
            "error": self.to_string(),
            "type": "import_error",
            "retryable": self.is_retryable(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_throttling_and_server_errors_as_retryable() {
        assert!(AppError::provider(Some(429), "quota").is_retryable());
        assert!(AppError::provider(Some(500), "boom").is_retryable());
        assert!(AppError::provider(Some(502), "bad gateway").is_retryable());
        assert!(!AppError::provider(Some(403), "denied").is_retryable());
        assert!(!AppError::provider(Some(404), "missing").is_retryable());
    }

    #[test]
    fn classifies_connection_failures_by_message() {
        assert!(AppError::provider(None, "request ETIMEDOUT").is_retryable());
        assert!(AppError::provider(None, "connection reset by peer").is_retryable());
        assert!(AppError::provider(None, "socket timed out").is_retryable());
        assert!(!AppError::provider(None, "invalid API key").is_retryable());
    }

    #[test]
    fn non_provider_errors_are_not_retryable() {
        assert!(!AppError::Config("missing key".into()).is_retryable());
        assert!(!AppError::BadRequest("city is required".into()).is_retryable());
    }

    #[test]
    fn maps_errors_to_http_statuses() {
        assert_eq!(
            AppError::BadRequest("city is required".into()).http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::provider(Some(429), "quota").http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::provider(None, "opaque").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Config("missing key".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
