//! API gateway abstraction
//!
//! Defines the [`DatasetApi`] trait covering the four backend operations
//! (upload, status poll, dataset page fetch, column type conversion) and the
//! HTTP implementation used against a live backend.
//!
//! Implementations perform no validation and hold no state beyond their
//! connection settings; callers own polling cadence and view state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{ColumnMeta, DataType, PageInfo, Row, TaskStatus};
use crate::validation::FileCandidate;

pub mod error;
pub(crate) mod wire;

#[cfg(feature = "api-backend")]
pub mod http;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{ApiError, ApiResult};
#[cfg(feature = "api-backend")]
pub use http::HttpDatasetApi;

/// Identifiers returned by a successful upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    pub task_id: String,
    pub dataset_id: String,
}

/// One page of a dataset as returned by the backend, already normalized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetPage {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    pub pagination: PageInfo,
}

/// Trait for dataset backends
///
/// This trait abstracts the REST endpoints the client consumes so the poller
/// and session can be driven by the HTTP client or by a scripted stand-in.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    /// Upload a file and start backend type inference
    async fn upload(&self, file: &FileCandidate) -> ApiResult<UploadReceipt>;

    /// Read the status of a backend task
    async fn poll_status(&self, dataset_id: &str, task_id: &str) -> ApiResult<TaskStatus>;

    /// Fetch columns, rows and pagination for a 1-based page
    async fn fetch_dataset(&self, dataset_id: &str, page: u32) -> ApiResult<DatasetPage>;

    /// Start a column type conversion; returns the new task id
    async fn patch_column_type(
        &self,
        column_id: &str,
        dataset_id: &str,
        target_type: DataType,
    ) -> ApiResult<String>;
}
