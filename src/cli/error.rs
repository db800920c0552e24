//! CLI error type

use data_alchemy_sdk::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to write output: {0}")]
    Output(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Message printed before exiting
    pub fn user_message(&self) -> String {
        match self {
            CliError::Session(err) => err.user_message(),
            CliError::Other(err) => format!("{:#}", err),
            other => other.to_string(),
        }
    }
}

impl From<data_alchemy_sdk::ApiError> for CliError {
    fn from(err: data_alchemy_sdk::ApiError) -> Self {
        CliError::Session(err.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}
