//! View-model store
//!
//! A single injectable store holding everything the presentation layer
//! renders. State changes only through [`ViewModelStore::dispatch`], which
//! applies one [`StoreEvent`] atomically and notifies subscribers when the
//! state actually changed.
//!
//! ```rust
//! use data_alchemy_sdk::store::{JobPhase, ViewModelStore};
//!
//! let store = ViewModelStore::new();
//! let updates = store.subscribe();
//! let job = store.begin_job();
//! assert!(updates.has_changed().unwrap());
//! assert_eq!(store.read(|s| s.phase), JobPhase::Submitting);
//! assert!(store.read(|s| s.is_current(job)));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::models::JobId;

pub mod state;

pub use state::{JobPhase, StoreEvent, ViewState};

/// Observable holder of the [`ViewState`]
#[derive(Debug)]
pub struct ViewModelStore {
    state: watch::Sender<ViewState>,
    next_id: AtomicU64,
}

impl Default for ViewModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModelStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            state,
            next_id: AtomicU64::new(1),
        }
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Clone of the current state
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Read part of the current state without cloning all of it
    pub fn read<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Apply an event; returns whether the state changed
    pub fn dispatch(&self, event: StoreEvent) -> bool {
        let name = event.name();
        let changed = self.state.send_if_modified(|state| state.apply(event));
        if changed {
            trace!(event = name, "Store updated");
        } else {
            debug!(event = name, "Event discarded");
        }
        changed
    }

    /// Issue a fresh job id and make it the live job
    ///
    /// Results of any previous job are discarded from here on.
    pub fn begin_job(&self) -> JobId {
        let job = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.dispatch(StoreEvent::JobRequested { job });
        job
    }

    /// Issue a fresh page request id
    pub fn next_page_request(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
