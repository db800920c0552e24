//! Data Alchemy SDK - Client library for dataset type inference
//!
//! Provides unified interfaces for:
//! - File validation before upload (size limit, CSV/Excel MIME types)
//! - The dataset REST API (upload, task status, dataset pages, type conversion)
//! - Job polling and reconciliation of inferred column types into snapshots
//! - An observable view-model store for presentation layers
//! - Column type overrides applied as backend conversion jobs
//!
//! ```rust,no_run
//! use data_alchemy_sdk::{ClientConfig, FileCandidate, InferenceSession};
//!
//! # async fn run() -> Result<(), data_alchemy_sdk::SessionError> {
//! let session = InferenceSession::from_config(&ClientConfig::default())?;
//! let file = FileCandidate::from_path("customers.csv").expect("readable file");
//! session.submit_file(file).await?;
//! session.wait_until_idle().await?;
//!
//! if let Some(snapshot) = session.state().snapshot {
//!     for column in &snapshot.columns {
//!         println!("{}: {}", column.name, column.effective_type());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use api::{ApiError, ApiResult, DatasetApi, DatasetPage, UploadReceipt};
#[cfg(feature = "api-backend")]
pub use api::HttpDatasetApi;
pub use config::ClientConfig;
pub use error::{SessionError, SessionResult};
pub use poller::JobPoller;
pub use reconcile::DataReconciler;
pub use session::InferenceSession;
pub use store::{JobPhase, StoreEvent, ViewModelStore, ViewState};
pub use validation::{FileCandidate, FileValidator, ValidationError};

// Re-export models
pub use models::{
    CellValue, ColumnMeta, DataType, DatasetSnapshot, JobId, JobTicket, PageInfo, PendingOverride,
    Row, TaskState, TaskStatus, UploadJob,
};
