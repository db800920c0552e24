//! Data reconciler
//!
//! Turns backend dataset pages into [`DatasetSnapshot`]s. A snapshot is only
//! produced when the whole page (columns, rows and pagination) was read; a
//! failed read yields an error and nothing partial.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ApiResult, DatasetApi, DatasetPage};
use crate::models::{ColumnMeta, DatasetSnapshot, Row};

/// Fetches and merges dataset pages
#[derive(Clone)]
pub struct DataReconciler {
    api: Arc<dyn DatasetApi>,
}

impl DataReconciler {
    pub fn new(api: Arc<dyn DatasetApi>) -> Self {
        Self { api }
    }

    /// Build a complete snapshot of `page` for `dataset_id`
    pub async fn reconcile(&self, dataset_id: &str, page: u32) -> ApiResult<DatasetSnapshot> {
        let DatasetPage {
            columns,
            rows,
            pagination,
        } = self.api.fetch_dataset(dataset_id, page).await?;
        warn_unknown_keys(dataset_id, &columns, &rows);
        debug!(
            dataset_id,
            page = pagination.current_page,
            columns = columns.len(),
            rows = rows.len(),
            "Reconciled dataset"
        );

        Ok(DatasetSnapshot {
            dataset_id: dataset_id.to_string(),
            columns,
            rows,
            pagination,
        })
    }

    /// Fetch another page of an already reconciled dataset
    ///
    /// Only rows and pagination are taken from the response; the columns of
    /// `current` are kept.
    pub async fn refresh_page(
        &self,
        current: &DatasetSnapshot,
        page: u32,
    ) -> ApiResult<DatasetSnapshot> {
        let fetched = self.api.fetch_dataset(&current.dataset_id, page).await?;
        warn_unknown_keys(&current.dataset_id, &current.columns, &fetched.rows);
        debug!(
            dataset_id = %current.dataset_id,
            page = fetched.pagination.current_page,
            rows = fetched.rows.len(),
            "Refreshed dataset page"
        );
        Ok(current.with_page(fetched.rows, fetched.pagination))
    }
}

fn warn_unknown_keys(dataset_id: &str, columns: &[ColumnMeta], rows: &[Row]) {
    let unknown = rows
        .iter()
        .flat_map(|row| row.keys())
        .find(|key| !columns.iter().any(|c| &c.name == *key));
    if let Some(key) = unknown {
        warn!(dataset_id, key = %key, "Row contains a key without column metadata");
    }
}
