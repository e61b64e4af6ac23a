use reqwest::StatusCode;
use thiserror::Error;

use crate::validation::FieldErrors;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification callers branch on when deciding what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Conflict,
    Unavailable,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Network(_) | AppError::Unavailable(_) | AppError::Config(_) => {
                ErrorKind::Unavailable
            }
        }
    }

    /// Build the error for a non-2xx response. `message` is the server's
    /// `message` field when the body carried one.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(
                message.unwrap_or_else(|| "Please login to continue".to_string()),
            ),
            StatusCode::NOT_FOUND => {
                AppError::NotFound(message.unwrap_or_else(|| "Event not found".to_string()))
            }
            StatusCode::CONFLICT => AppError::Conflict(
                message.unwrap_or_else(|| "You have already joined this event".to_string()),
            ),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => match message {
                // Some deployments report duplicate joins as a plain 400
                Some(msg) if is_duplicate_join_message(&msg) => AppError::Conflict(msg),
                Some(msg) => AppError::BadRequest(msg),
                None => AppError::BadRequest(format!("Request rejected ({})", status)),
            },
            _ => AppError::Unavailable(
                message.unwrap_or_else(|| format!("Unexpected response status {}", status)),
            ),
        }
    }

    /// Text for the notification shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.to_string(),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Network(_) => {
                "Could not reach the events service. Please try again.".to_string()
            }
            AppError::Unavailable(_) => {
                "The events service is unavailable right now. Please try again.".to_string()
            }
            AppError::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }
}

pub(crate) fn is_duplicate_join_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("already joined")
        || lower.contains("already registered")
        || lower.contains("already a participant")
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Unavailable(format!("Malformed response: {}", err))
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Unavailable(format!("Malformed response: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
