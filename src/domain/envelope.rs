use serde::{Deserialize, Serialize};

use crate::error::{is_duplicate_join_message, AppError, Result};

/// `{success, data, message}` wrapper every events API response uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap a 2xx envelope. `success: false` is still a failure even when
    /// the transport reported success.
    pub fn into_result(self) -> Result<Option<T>> {
        if self.success {
            return Ok(self.data);
        }

        let message = self
            .message
            .unwrap_or_else(|| "Request was not successful".to_string());
        if is_duplicate_join_message(&message) {
            Err(AppError::Conflict(message))
        } else {
            Err(AppError::Unavailable(message))
        }
    }

    pub fn into_data(self) -> Result<T> {
        self.into_result()?
            .ok_or_else(|| AppError::Unavailable("Response carried no data".to_string()))
    }
}

/// Error bodies vary between `{message}` and `{error}`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}
