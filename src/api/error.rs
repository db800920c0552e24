//! Error types for gateway operations
//!
//! Every failure that happens past client-side validation is reported as an
//! [`ApiError`]: structured backend errors keep their code and message,
//! while transport, timeout and decoding failures are wrapped with code 500.

use std::collections::BTreeMap;

use thiserror::Error;

/// Code used for failures that did not come with a backend status
pub const UNEXPECTED_ERROR_CODE: u16 = 500;

/// Code used when a backend task reports failure
pub const TASK_FAILED_CODE: u16 = 422;

/// Failure reported by (or while talking to) the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct ApiError {
    /// HTTP-like status code
    pub code: u16,
    /// Message suitable for a notification
    pub message: String,
    /// Field-level details from the backend `errors` object
    pub details: BTreeMap<String, Vec<String>>,
}

/// Result type for gateway operations
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Wrap an unclassified failure
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(UNEXPECTED_ERROR_CODE, message)
    }

    /// A backend task that ran and reported failure
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::new(TASK_FAILED_CODE, message)
    }

    pub fn with_details(mut self, details: BTreeMap<String, Vec<String>>) -> Self {
        self.details = details;
        self
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        let mut message = self.message.clone();
        for (field, errors) in &self.details {
            for error in errors {
                message.push_str(&format!("\n  - {field}: {error}"));
            }
        }

        match self.code {
            UNEXPECTED_ERROR_CODE if self.details.is_empty() => {
                message.push_str(
                    "\n\nHints:\n\
                    - Check that the API server is running\n\
                    - Verify the API URL (--api-url or DATA_ALCHEMY_API_URL)",
                );
            }
            404 => {
                message.push_str("\n\nHint: the dataset, task or column id may be wrong");
            }
            _ => {}
        }
        message
    }
}

#[cfg(feature = "api-backend")]
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::unexpected("Request timed out")
        } else if err.is_connect() {
            ApiError::unexpected(format!("Failed to connect to API server: {}", err))
        } else if err.is_decode() {
            ApiError::unexpected(format!("Failed to parse response: {}", err))
        } else {
            ApiError::unexpected(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::unexpected(format!("Failed to parse response: {}", err))
    }
}
