//! Inference session
//!
//! [`InferenceSession`] wires the gateway, store, poller and reconciler into
//! the operations a front end calls: pick a file, upload it, follow the
//! inference job, page through the result and override column types.
//!
//! Every operation reports its outcome twice: as the returned `Result` and as
//! a state change observers see through [`InferenceSession::subscribe`].
//! Failures never leave the store loading.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, DatasetApi};
use crate::config::ClientConfig;
use crate::error::{SessionError, SessionResult};
use crate::models::{ColumnMeta, DataType, JobId, JobTicket, UploadJob};
use crate::poller::JobPoller;
use crate::reconcile::DataReconciler;
use crate::store::{JobPhase, StoreEvent, ViewModelStore, ViewState};
use crate::validation::{FileCandidate, FileValidator, ValidationError};

/// Client-side controller for one upload/inspect/override workflow
pub struct InferenceSession {
    api: Arc<dyn DatasetApi>,
    store: Arc<ViewModelStore>,
    poller: JobPoller,
    reconciler: DataReconciler,
    validator: FileValidator,
}

impl InferenceSession {
    /// Create a session over any [`DatasetApi`] implementation
    pub fn new(api: Arc<dyn DatasetApi>, config: &ClientConfig) -> Self {
        let store = Arc::new(ViewModelStore::new());
        let reconciler = DataReconciler::new(api.clone());
        let poller = JobPoller::new(
            api.clone(),
            store.clone(),
            reconciler.clone(),
            config.poll_interval(),
        );
        Self {
            api,
            store,
            poller,
            reconciler,
            validator: config.file_validator(),
        }
    }

    /// Create a session talking to the HTTP backend described by `config`
    #[cfg(feature = "api-backend")]
    pub fn from_config(config: &ClientConfig) -> SessionResult<Self> {
        let api = crate::api::HttpDatasetApi::new(config)?;
        Ok(Self::new(Arc::new(api), config))
    }

    pub fn store(&self) -> &Arc<ViewModelStore> {
        &self.store
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.store.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.store.state()
    }

    /// Record the file the next [`submit`](Self::submit) uploads
    pub fn select_file(&self, file: FileCandidate) {
        self.store.dispatch(StoreEvent::FileSelected(Arc::new(file)));
    }

    /// Select `file` and upload it
    pub async fn submit_file(&self, file: FileCandidate) -> SessionResult<JobTicket> {
        self.select_file(file);
        self.submit().await
    }

    /// Validate and upload the selected file, then follow its inference job
    ///
    /// Validation happens before anything is sent; a rejected file never
    /// reaches the backend. On success the returned ticket identifies the
    /// job now being polled.
    pub async fn submit(&self) -> SessionResult<JobTicket> {
        let file = self.store.read(|s| s.file.clone());
        if let Err(err) = self.validator.validate(file.as_deref()) {
            return Err(self.raise(err));
        }
        let Some(file) = file else {
            return Err(self.raise(ValidationError::MissingFile));
        };

        self.poller.cancel();
        let guard = RequestGuard::begin(&self.store);
        let job = guard.job;
        info!(%job, file = %file.name, size = file.size, "Uploading file");

        let result = self.api.upload(&file).await;
        guard.disarm();
        match result {
            Ok(receipt) => {
                let ticket = JobTicket {
                    id: job,
                    job: UploadJob::new(receipt.dataset_id, receipt.task_id),
                };
                self.follow(ticket.clone());
                Ok(ticket)
            }
            Err(err) => {
                warn!(%job, code = err.code, error = %err.message, "Upload failed");
                self.store.dispatch(StoreEvent::RequestFailed {
                    job,
                    error: err.clone(),
                });
                Err(err.into())
            }
        }
    }

    /// Load page 1 of an already processed dataset
    ///
    /// Any live job is cancelled. No status polling takes place.
    pub async fn open_dataset(&self, dataset_id: &str) -> SessionResult<()> {
        self.poller.cancel();
        self.store.dispatch(StoreEvent::JobCancelled);

        let request = self.store.next_page_request();
        self.store
            .dispatch(StoreEvent::PageRequested { request, page: 1 });
        debug!(dataset_id, "Opening dataset");

        match self.reconciler.reconcile(dataset_id, 1).await {
            Ok(snapshot) => {
                self.store
                    .dispatch(StoreEvent::PageLoaded { request, snapshot });
                Ok(())
            }
            Err(err) => {
                self.store.dispatch(StoreEvent::PageFailed {
                    request,
                    error: err.clone(),
                });
                Err(err.into())
            }
        }
    }

    /// Show another page of the current dataset
    ///
    /// Only rows and pagination are fetched again; the known columns stay.
    /// Fails with [`SessionError::Superseded`] when a newer page request or
    /// job replaced this one and the requested page is not on display.
    pub async fn change_page(&self, page: u32) -> SessionResult<()> {
        let Some(snapshot) = self.store.read(|s| s.snapshot.clone()) else {
            return Err(self.raise(ValidationError::NoDataset));
        };
        if !snapshot.pagination.contains(page) {
            return Err(self.raise(ValidationError::PageOutOfRange {
                page,
                last_page: snapshot.pagination.last_page(),
            }));
        }
        if page == snapshot.pagination.current_page {
            return Ok(());
        }

        let request = self.store.next_page_request();
        self.store
            .dispatch(StoreEvent::PageRequested { request, page });
        debug!(dataset_id = %snapshot.dataset_id, page, "Changing page");

        match self.reconciler.refresh_page(&snapshot, page).await {
            Ok(snapshot) => {
                if self
                    .store
                    .dispatch(StoreEvent::PageLoaded { request, snapshot })
                {
                    return Ok(());
                }
                let shown = self.store.read(|s| {
                    s.snapshot
                        .as_ref()
                        .is_some_and(|snapshot| snapshot.pagination.current_page == page)
                });
                if shown {
                    Ok(())
                } else {
                    debug!(page, "Page response superseded");
                    Err(SessionError::Superseded)
                }
            }
            Err(err) => {
                self.store.dispatch(StoreEvent::PageFailed {
                    request,
                    error: err.clone(),
                });
                Err(err.into())
            }
        }
    }

    /// Look up a column of the current snapshot by name
    pub fn column(&self, name: &str) -> SessionResult<ColumnMeta> {
        let column = self.store.read(|s| {
            s.snapshot
                .as_ref()
                .map(|snapshot| snapshot.column(name).cloned())
        });
        match column {
            None => Err(ValidationError::NoDataset.into()),
            Some(None) => Err(ValidationError::UnknownColumn(name.to_string()).into()),
            Some(Some(column)) => Ok(column),
        }
    }

    /// Record or dismiss a type override for `column`
    ///
    /// `None` dismisses a pending override for that column. A type equal to
    /// the column's current type records nothing. Returns whether the pending
    /// override changed.
    pub fn set_type_override(&self, column: &ColumnMeta, new_type: Option<DataType>) -> bool {
        self.store.dispatch(StoreEvent::OverrideChanged {
            column: column.clone(),
            new_type,
        })
    }

    /// Send the pending override and follow the conversion job
    ///
    /// On failure the override stays pending so it can be retried.
    pub async fn apply_override(&self) -> SessionResult<JobTicket> {
        let Some(pending) = self.store.read(|s| s.pending_override.clone()) else {
            return Err(self.raise(ValidationError::NoPendingOverride));
        };
        let Some(dataset_id) = self.store.read(|s| s.dataset_id.clone()) else {
            return Err(self.raise(ValidationError::NoDataset));
        };

        self.poller.cancel();
        let guard = RequestGuard::begin(&self.store);
        let job = guard.job;
        info!(
            %job,
            column = %pending.column.name,
            from = %pending.column.effective_type(),
            to = %pending.new_type,
            "Applying type override"
        );

        let result = self
            .api
            .patch_column_type(&pending.column.id, &dataset_id, pending.new_type)
            .await;
        guard.disarm();
        match result {
            Ok(task_id) => {
                self.store.dispatch(StoreEvent::OverrideApplied(pending));
                let ticket = JobTicket {
                    id: job,
                    job: UploadJob::new(dataset_id, task_id),
                };
                self.follow(ticket.clone());
                Ok(ticket)
            }
            Err(err) => {
                warn!(%job, code = err.code, error = %err.message, "Type conversion request failed");
                self.store.dispatch(StoreEvent::RequestFailed {
                    job,
                    error: err.clone(),
                });
                Err(err.into())
            }
        }
    }

    /// Wait until no job is loading
    ///
    /// Returns the surfaced error if the last job failed.
    pub async fn wait_until_idle(&self) -> SessionResult<()> {
        let mut rx = self.store.subscribe();
        let failure = rx
            .wait_for(|s| !s.loading)
            .await
            .map(|state| {
                (state.phase == JobPhase::Failed)
                    .then(|| state.last_error.clone())
                    .flatten()
            })
            .map_err(|_| SessionError::from(ApiError::unexpected("Session closed")))?;
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Cancel the live job; nothing it had in flight reaches the store
    pub fn shutdown(&self) {
        if self.poller.cancel() {
            debug!("Cancelled running job");
        }
        self.store.dispatch(StoreEvent::JobCancelled);
    }

    /// Hand a started job to the poller unless a newer job took over
    fn follow(&self, ticket: JobTicket) {
        if self.store.dispatch(StoreEvent::JobStarted(ticket.clone())) {
            self.poller.start(ticket);
        } else {
            debug!(job = %ticket.id, "Job superseded before polling started");
        }
    }

    /// Surface a validation failure and hand it back as an error
    fn raise(&self, err: ValidationError) -> SessionError {
        let err = SessionError::from(err);
        self.store.dispatch(StoreEvent::ErrorRaised(err.clone()));
        err
    }
}

/// Job whose upload or conversion request is in flight
///
/// If the future waiting on the request is dropped, the job is abandoned so
/// the store does not stay loading.
struct RequestGuard<'a> {
    store: &'a ViewModelStore,
    job: JobId,
    armed: bool,
}

impl<'a> RequestGuard<'a> {
    fn begin(store: &'a ViewModelStore) -> Self {
        Self {
            store,
            job: store.begin_job(),
            armed: true,
        }
    }

    /// The request resolved; its outcome is dispatched by the caller
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.store.dispatch(StoreEvent::RequestAbandoned { job: self.job }) {
            debug!(job = %self.job, "Request abandoned before a task id arrived");
        }
    }
}

impl Drop for InferenceSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
