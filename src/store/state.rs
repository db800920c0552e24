//! View state and its update rules
//!
//! [`ViewState::apply`] is the only way the state changes. It is a pure
//! function of the prior state and one [`StoreEvent`], and it returns
//! whether anything changed. Events produced by asynchronous work carry the
//! identity of the job or page request they belong to; events for a job or
//! request that is no longer current are ignored.

use std::sync::Arc;

use serde::Serialize;

use crate::api::ApiError;
use crate::error::SessionError;
use crate::models::{ColumnMeta, DataType, DatasetSnapshot, JobId, JobTicket, PendingOverride};
use crate::validation::FileCandidate;

/// Lifecycle phase of the live job
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No job is running
    #[default]
    Idle,
    /// Upload or type conversion request in flight, no task id yet
    Submitting,
    /// Task status is being polled
    Polling,
    /// Task succeeded, snapshot is being fetched
    Reconciling,
    /// The last job failed; see `last_error`
    Failed,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub file: Option<Arc<FileCandidate>>,
    pub dataset_id: Option<String>,
    /// Job whose results may still change this state
    pub active_job: Option<JobId>,
    /// Task being polled for the active job
    pub task: Option<JobTicket>,
    pub phase: JobPhase,
    pub snapshot: Option<Arc<DatasetSnapshot>>,
    pub pending_override: Option<PendingOverride>,
    pub loading: bool,
    pub progress: u8,
    pub stage: Option<String>,
    pub current_page: u32,
    /// Outstanding page request, if any
    pub page_request: Option<u64>,
    pub last_error: Option<SessionError>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            file: None,
            dataset_id: None,
            active_job: None,
            task: None,
            phase: JobPhase::Idle,
            snapshot: None,
            pending_override: None,
            loading: false,
            progress: 0,
            stage: None,
            current_page: 1,
            page_request: None,
            last_error: None,
        }
    }
}

/// A single state transition
#[derive(Debug, Clone)]
pub enum StoreEvent {
    FileSelected(Arc<FileCandidate>),
    /// An upload or type conversion request is about to be sent
    JobRequested { job: JobId },
    /// The request for `job` failed before a task id was returned
    RequestFailed { job: JobId, error: ApiError },
    /// The caller stopped waiting for the request of `job`
    RequestAbandoned { job: JobId },
    /// The backend accepted the request and returned a task to poll
    JobStarted(JobTicket),
    Progress {
        job: JobId,
        progress: u8,
        stage: Option<String>,
    },
    ReconcileStarted { job: JobId },
    SnapshotReady {
        job: JobId,
        snapshot: DatasetSnapshot,
    },
    JobFailed { job: JobId, error: ApiError },
    /// The live job was cancelled (teardown or superseded by a page open)
    JobCancelled,
    PageRequested { request: u64, page: u32 },
    PageLoaded {
        request: u64,
        snapshot: DatasetSnapshot,
    },
    PageFailed { request: u64, error: ApiError },
    OverrideChanged {
        column: ColumnMeta,
        new_type: Option<DataType>,
    },
    /// The given override was sent to the backend
    OverrideApplied(PendingOverride),
    ErrorRaised(SessionError),
}

impl StoreEvent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::FileSelected(_) => "file_selected",
            StoreEvent::JobRequested { .. } => "job_requested",
            StoreEvent::RequestFailed { .. } => "request_failed",
            StoreEvent::RequestAbandoned { .. } => "request_abandoned",
            StoreEvent::JobStarted(_) => "job_started",
            StoreEvent::Progress { .. } => "progress",
            StoreEvent::ReconcileStarted { .. } => "reconcile_started",
            StoreEvent::SnapshotReady { .. } => "snapshot_ready",
            StoreEvent::JobFailed { .. } => "job_failed",
            StoreEvent::JobCancelled => "job_cancelled",
            StoreEvent::PageRequested { .. } => "page_requested",
            StoreEvent::PageLoaded { .. } => "page_loaded",
            StoreEvent::PageFailed { .. } => "page_failed",
            StoreEvent::OverrideChanged { .. } => "override_changed",
            StoreEvent::OverrideApplied(_) => "override_applied",
            StoreEvent::ErrorRaised(_) => "error_raised",
        }
    }
}

impl ViewState {
    /// Progress to present: the live value while loading, complete otherwise
    pub fn displayed_progress(&self) -> u8 {
        if self.loading { self.progress } else { 100 }
    }

    pub fn is_current(&self, job: JobId) -> bool {
        self.active_job == Some(job)
    }

    /// Type currently shown for a column, counting a pending override
    pub fn displayed_type(&self, column: &ColumnMeta) -> DataType {
        match &self.pending_override {
            Some(pending) if pending.column.name == column.name => pending.new_type,
            _ => column.effective_type(),
        }
    }

    /// Apply one event; returns whether the state changed
    pub fn apply(&mut self, event: StoreEvent) -> bool {
        match event {
            StoreEvent::FileSelected(file) => {
                self.file = Some(file);
                true
            }
            StoreEvent::JobRequested { job } => {
                self.active_job = Some(job);
                self.task = None;
                self.phase = JobPhase::Submitting;
                self.loading = true;
                self.progress = 0;
                self.stage = None;
                // A page load still in flight is dropped; show the page we have
                if self.page_request.take().is_some() {
                    self.current_page = self.shown_page();
                }
                self.last_error = None;
                true
            }
            StoreEvent::RequestFailed { job, error } => {
                if !self.is_current(job) {
                    return false;
                }
                self.finish(JobPhase::Failed);
                self.last_error = Some(error.into());
                true
            }
            StoreEvent::RequestAbandoned { job } => {
                if !self.is_current(job) {
                    return false;
                }
                self.finish(JobPhase::Idle);
                true
            }
            StoreEvent::JobStarted(ticket) => {
                if !self.is_current(ticket.id) {
                    return false;
                }
                if self.dataset_id.as_deref() != Some(ticket.dataset_id()) {
                    self.snapshot = None;
                    self.pending_override = None;
                    self.current_page = 1;
                    self.dataset_id = Some(ticket.dataset_id().to_string());
                }
                self.task = Some(ticket);
                self.phase = JobPhase::Polling;
                self.loading = true;
                self.progress = 0;
                true
            }
            StoreEvent::Progress {
                job,
                progress,
                stage,
            } => {
                if !self.is_current(job) || self.phase != JobPhase::Polling {
                    return false;
                }
                let progress = progress.min(100);
                let changed = self.progress != progress || self.stage != stage;
                self.progress = progress;
                self.stage = stage;
                changed
            }
            StoreEvent::ReconcileStarted { job } => {
                if !self.is_current(job) {
                    return false;
                }
                self.phase = JobPhase::Reconciling;
                true
            }
            StoreEvent::SnapshotReady { job, snapshot } => {
                if !self.is_current(job) {
                    return false;
                }
                self.finish(JobPhase::Idle);
                self.progress = 100;
                self.page_request = None;
                self.current_page = snapshot.pagination.current_page;
                self.dataset_id = Some(snapshot.dataset_id.clone());
                self.snapshot = Some(Arc::new(snapshot));
                true
            }
            StoreEvent::JobFailed { job, error } => {
                if !self.is_current(job) {
                    return false;
                }
                self.finish(JobPhase::Failed);
                self.last_error = Some(error.into());
                true
            }
            StoreEvent::JobCancelled => {
                if self.active_job.is_none() {
                    return false;
                }
                self.finish(JobPhase::Idle);
                true
            }
            StoreEvent::PageRequested { request, page } => {
                self.page_request = Some(request);
                self.current_page = match &self.snapshot {
                    Some(snapshot) => snapshot.pagination.clamp_page(page),
                    None => page.max(1),
                };
                true
            }
            StoreEvent::PageLoaded { request, snapshot } => {
                if self.page_request != Some(request) {
                    return false;
                }
                if self.dataset_id.as_deref() != Some(snapshot.dataset_id.as_str()) {
                    self.pending_override = None;
                    self.dataset_id = Some(snapshot.dataset_id.clone());
                    if self.active_job.is_none() {
                        self.phase = JobPhase::Idle;
                        self.last_error = None;
                    }
                }
                self.page_request = None;
                self.current_page = snapshot.pagination.current_page;
                self.snapshot = Some(Arc::new(snapshot));
                true
            }
            StoreEvent::PageFailed { request, error } => {
                if self.page_request != Some(request) {
                    return false;
                }
                self.page_request = None;
                self.current_page = self.shown_page();
                self.last_error = Some(error.into());
                true
            }
            StoreEvent::OverrideChanged { column, new_type } => match new_type {
                None => {
                    let matches = self
                        .pending_override
                        .as_ref()
                        .is_some_and(|p| p.column.name == column.name);
                    if matches {
                        self.pending_override = None;
                    }
                    matches
                }
                Some(new_type) if new_type != column.effective_type() => {
                    let pending = PendingOverride { column, new_type };
                    if self.pending_override.as_ref() == Some(&pending) {
                        return false;
                    }
                    self.pending_override = Some(pending);
                    true
                }
                Some(_) => false,
            },
            StoreEvent::OverrideApplied(applied) => {
                if self.pending_override.as_ref() != Some(&applied) {
                    return false;
                }
                self.pending_override = None;
                true
            }
            StoreEvent::ErrorRaised(error) => {
                self.last_error = Some(error);
                true
            }
        }
    }

    /// Page of the snapshot on display, 1 without one
    fn shown_page(&self) -> u32 {
        self.snapshot
            .as_ref()
            .map_or(1, |s| s.pagination.current_page)
    }

    /// End the live job and leave loading
    fn finish(&mut self, phase: JobPhase) {
        self.active_job = None;
        self.task = None;
        self.phase = phase;
        self.loading = false;
        self.stage = None;
    }
}
