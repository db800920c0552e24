//! Models module for the SDK
//!
//! Defines the data structures shared by the gateway client, the view-model
//! store and the job poller. Backend payload spellings never reach these
//! types; they are normalized in [`crate::api`].

pub mod column;
pub mod dataset;
pub mod task;

pub use column::{ColumnMeta, DataType, PendingOverride, UnknownDataType};
pub use dataset::{CellValue, DatasetSnapshot, PageInfo, Row};
pub use task::{JobId, JobTicket, TaskState, TaskStatus, UploadJob};
