//! Job poller
//!
//! Drives one backend task at a time: polls its status on a fixed interval,
//! publishes progress to the store and, once the task succeeds, reconciles
//! the dataset into a fresh snapshot.
//!
//! Each job runs as its own tokio task. Starting another job aborts the
//! previous task, which drops both its timer and any request still in
//! flight. Results are additionally checked against the store's live job
//! before they are applied, so a late response can never leak into state
//! that belongs to a newer job.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, debug, error, info, info_span};

use crate::api::{ApiError, DatasetApi};
use crate::models::{JobTicket, TaskState};
use crate::reconcile::DataReconciler;
use crate::store::{StoreEvent, ViewModelStore};

/// Message used when a failed task does not say why
const TASK_FAILED_MESSAGE: &str = "Processing failed";

/// Polls the live job and reconciles its dataset on success
pub struct JobPoller {
    api: Arc<dyn DatasetApi>,
    store: Arc<ViewModelStore>,
    reconciler: DataReconciler,
    interval: Duration,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl JobPoller {
    pub fn new(
        api: Arc<dyn DatasetApi>,
        store: Arc<ViewModelStore>,
        reconciler: DataReconciler,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            store,
            reconciler,
            interval,
            active: Mutex::new(None),
        }
    }

    /// Start polling the task of `ticket`, replacing any running job
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, ticket: JobTicket) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.take() {
            previous.abort();
        }

        let span = info_span!(
            "poll_job",
            job = %ticket.id,
            dataset_id = %ticket.dataset_id(),
            task_id = ticket.task_id().unwrap_or_default(),
        );
        let job = PollJob {
            api: self.api.clone(),
            store: self.store.clone(),
            reconciler: self.reconciler.clone(),
            interval: self.interval,
            ticket,
        };
        *active = Some(tokio::spawn(job.run().instrument(span)));
    }

    /// Stop the running job, if any
    ///
    /// Returns whether a job was still running.
    pub fn cancel(&self) -> bool {
        let handle = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

enum PollOutcome {
    Succeeded,
    Failed(ApiError),
    /// Another job took over while this one was polling
    Superseded,
}

/// Everything one spawned poll loop owns
struct PollJob {
    api: Arc<dyn DatasetApi>,
    store: Arc<ViewModelStore>,
    reconciler: DataReconciler,
    interval: Duration,
    ticket: JobTicket,
}

impl PollJob {
    async fn run(self) {
        let job = self.ticket.id;
        let Some(task_id) = self.ticket.task_id().map(str::to_string) else {
            self.store.dispatch(StoreEvent::JobFailed {
                job,
                error: ApiError::unexpected("Job has no task id"),
            });
            return;
        };
        let dataset_id = self.ticket.dataset_id().to_string();
        info!("Polling task");

        match self.poll_until_done(&dataset_id, &task_id).await {
            PollOutcome::Succeeded => {}
            PollOutcome::Superseded => {
                debug!("Job no longer current, stopping");
                return;
            }
            PollOutcome::Failed(err) => {
                error!(code = err.code, error = %err.message, "Job failed");
                self.store.dispatch(StoreEvent::JobFailed { job, error: err });
                return;
            }
        }

        if !self.store.dispatch(StoreEvent::ReconcileStarted { job }) {
            debug!("Job superseded before reconciliation");
            return;
        }
        let mut page = self.store.read(|s| s.current_page);
        loop {
            let snapshot = match self.reconciler.reconcile(&dataset_id, page).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    error!(code = err.code, error = %err.message, "Reconciliation failed");
                    self.store.dispatch(StoreEvent::JobFailed { job, error: err });
                    return;
                }
            };

            // The user moved to another page while we were fetching
            let (current, latest) = self.store.read(|s| (s.is_current(job), s.current_page));
            if current && latest != page {
                debug!(from = page, to = latest, "Page changed during reconciliation");
                page = latest;
                continue;
            }

            info!(
                page = snapshot.pagination.current_page,
                columns = snapshot.columns.len(),
                "Job completed"
            );
            self.store.dispatch(StoreEvent::SnapshotReady { job, snapshot });
            return;
        }
    }

    /// Tick until the task succeeds; ticks never overlap
    ///
    /// The timer is dropped before this returns.
    async fn poll_until_done(&self, dataset_id: &str, task_id: &str) -> PollOutcome {
        let job = self.ticket.id;
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.store.read(|s| s.is_current(job)) {
                return PollOutcome::Superseded;
            }

            let status = match self.api.poll_status(dataset_id, task_id).await {
                Ok(status) => status,
                Err(err) => return PollOutcome::Failed(err),
            };
            debug!(state = ?status.state, progress = status.progress, "Task status");
            match status.state {
                TaskState::InProgress => {
                    self.store.dispatch(StoreEvent::Progress {
                        job,
                        progress: status.progress,
                        stage: status.message,
                    });
                }
                TaskState::Succeeded => {
                    self.store.dispatch(StoreEvent::Progress {
                        job,
                        progress: 100,
                        stage: status.message,
                    });
                    return PollOutcome::Succeeded;
                }
                TaskState::Failed => {
                    let message = status
                        .message
                        .unwrap_or_else(|| TASK_FAILED_MESSAGE.to_string());
                    return PollOutcome::Failed(ApiError::task_failed(message));
                }
            }
        }
    }
}
