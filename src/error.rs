//! Error type surfaced by the session
//!
//! Callers mostly branch on two kinds: a client-side validation failure
//! (raised before any network call) or an API failure (everything that
//! happened past validation, including transport errors). A request whose
//! result was discarded for a newer one reports [`SessionError::Superseded`].

use thiserror::Error;

use crate::api::ApiError;
use crate::validation::ValidationError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Request superseded by a newer one")]
    Superseded,
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(err) => err.to_string(),
            SessionError::Api(err) => err.user_message(),
            SessionError::Superseded => self.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}
