//! Asynchronous backend task model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized state of a backend task
///
/// Backends report queued, started and progressing tasks under various
/// names; all of them collapse into `InProgress`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    InProgress,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Parse a backend status name (case-insensitive)
    ///
    /// An empty name is reported for tasks the result backend does not know
    /// yet, which is the same as a queued task.
    pub fn from_backend(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "pending" | "queued" | "started" | "received" | "retry" | "progress"
            | "in-progress" | "in_progress" | "running" => Some(TaskState::InProgress),
            "success" | "succeeded" | "completed" | "done" => Some(TaskState::Succeeded),
            "failure" | "failed" | "revoked" | "error" => Some(TaskState::Failed),
            _ => None,
        }
    }
}

/// One status reading of a backend task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStatus {
    pub state: TaskState,
    /// Percentage, 0 to 100
    pub progress: u8,
    /// Current stage or failure reason, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskStatus {
    pub fn in_progress(progress: u8) -> Self {
        Self {
            state: TaskState::InProgress,
            progress: progress.min(100),
            message: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            state: TaskState::Succeeded,
            progress: 100,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Failed,
            progress: 0,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Dataset and task identifiers of the live asynchronous job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadJob {
    pub dataset_id: String,
    pub task_id: Option<String>,
}

impl UploadJob {
    pub fn new(dataset_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            task_id: Some(task_id.into()),
        }
    }
}

/// Identity of a job within one store
///
/// Issued in increasing order; every asynchronous result carries the id of
/// the job it was requested for and is dropped if that job is no longer live.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// A live job together with its identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobTicket {
    pub id: JobId,
    pub job: UploadJob,
}

impl JobTicket {
    pub fn dataset_id(&self) -> &str {
        &self.job.dataset_id
    }

    pub fn task_id(&self) -> Option<&str> {
        self.job.task_id.as_deref()
    }
}
