//! Validation functionality
//!
//! Provides client-side checks that run before any network call:
//! - File validation (presence, size limit, MIME type)
//! - Session preconditions (pending override, loaded dataset, page range)
//!
//! Validation errors are never retried; they are shown to the user as-is.

pub mod file;

pub use file::{FileCandidate, FileSource, FileValidator, mime_for_extension};

/// Error raised by client-side validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No file provided")]
    MissingFile,
    #[error("File size exceeds {limit_mb}MB limit")]
    FileTooLarge { size: u64, limit_mb: u64 },
    #[error("Invalid file type. Please upload a CSV or Excel file")]
    InvalidFileType { mime: Option<String> },
    #[error("No pending type override to apply")]
    NoPendingOverride,
    #[error("No dataset loaded")]
    NoDataset,
    #[error("Column not found: {0}")]
    UnknownColumn(String),
    #[error("Page {page} is out of range (1-{last_page})")]
    PageOutOfRange { page: u32, last_page: u32 },
}
