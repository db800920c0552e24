//! Scripted dataset backend for tests
//!
//! Serves a fixed set of columns and rows, replays queued status readings per
//! task and records every call so tests can assert on what was requested.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiError, ApiResult, DatasetApi, DatasetPage, UploadReceipt};
use crate::models::{CellValue, ColumnMeta, DataType, PageInfo, Row, TaskStatus};
use crate::validation::FileCandidate;

#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub uploads: Vec<String>,
    pub polls: Vec<(String, String)>,
    pub fetches: Vec<(String, u32)>,
    pub patches: Vec<(String, String, DataType)>,
}

pub(crate) struct ScriptedApi {
    columns: Mutex<Vec<ColumnMeta>>,
    rows: Vec<Row>,
    page_size: u32,
    uploads: Mutex<VecDeque<ApiResult<UploadReceipt>>>,
    statuses: Mutex<HashMap<String, VecDeque<ApiResult<TaskStatus>>>>,
    patches: Mutex<VecDeque<ApiResult<String>>>,
    fetch_failures: Mutex<u32>,
    request_delay: Mutex<Duration>,
    fetch_delay: Mutex<Duration>,
    pub calls: Mutex<Calls>,
}

impl ScriptedApi {
    /// Backend with columns id/name/age and `row_count` rows, 20 rows per page
    pub fn new(row_count: usize) -> Self {
        let columns = vec![
            ColumnMeta::new("1", "id", 0, DataType::Integer),
            ColumnMeta::new("2", "name", 1, DataType::Text),
            ColumnMeta::new("3", "age", 2, DataType::Integer),
        ];
        let rows = (0..row_count)
            .map(|i| {
                Row::from([
                    ("id".to_string(), CellValue::Number((i as u64 + 1).into())),
                    ("name".to_string(), CellValue::Text(format!("User {}", i + 1))),
                    ("age".to_string(), CellValue::Number((20 + i as u64 % 50).into())),
                ])
            })
            .collect();

        Self {
            columns: Mutex::new(columns),
            rows,
            page_size: 20,
            uploads: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            patches: Mutex::new(VecDeque::new()),
            fetch_failures: Mutex::new(0),
            request_delay: Mutex::new(Duration::ZERO),
            fetch_delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn push_upload(&self, result: ApiResult<UploadReceipt>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_statuses(&self, task_id: &str, statuses: Vec<ApiResult<TaskStatus>>) {
        self.statuses
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .extend(statuses);
    }

    pub fn push_patch(&self, result: ApiResult<String>) {
        self.patches.lock().unwrap().push_back(result);
    }

    /// Make the next `count` dataset fetches fail
    pub fn fail_fetches(&self, count: u32) {
        *self.fetch_failures.lock().unwrap() = count;
    }

    /// Delay every upload and type conversion request
    pub fn delay_requests(&self, delay: Duration) {
        *self.request_delay.lock().unwrap() = delay;
    }

    pub fn delay_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    pub fn poll_count(&self, task_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .polls
            .iter()
            .filter(|(_, t)| t == task_id)
            .count()
    }

    pub fn fetches(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().fetches.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.calls.lock().unwrap().uploads.len()
    }

    pub fn patch_count(&self) -> usize {
        self.calls.lock().unwrap().patches.len()
    }
}

#[async_trait]
impl DatasetApi for ScriptedApi {
    async fn upload(&self, file: &FileCandidate) -> ApiResult<UploadReceipt> {
        self.calls.lock().unwrap().uploads.push(file.name.clone());
        let delay = *self.request_delay.lock().unwrap();
        pause(delay).await;
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::unexpected("no scripted upload")))
    }

    async fn poll_status(&self, dataset_id: &str, task_id: &str) -> ApiResult<TaskStatus> {
        self.calls
            .lock()
            .unwrap()
            .polls
            .push((dataset_id.to_string(), task_id.to_string()));
        // An exhausted script keeps the task running
        self.statuses
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(TaskStatus::in_progress(0)))
    }

    async fn fetch_dataset(&self, dataset_id: &str, page: u32) -> ApiResult<DatasetPage> {
        self.calls
            .lock()
            .unwrap()
            .fetches
            .push((dataset_id.to_string(), page));
        let delay = *self.fetch_delay.lock().unwrap();
        pause(delay).await;

        {
            let mut failures = self.fetch_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ApiError::new(500, "Failed to retrieve dataset"));
            }
        }

        let total_items = self.rows.len() as u64;
        let total_pages = total_items.div_ceil(self.page_size as u64) as u32;
        let start = ((page.max(1) - 1) * self.page_size) as usize;
        let rows = self
            .rows
            .iter()
            .skip(start)
            .take(self.page_size as usize)
            .cloned()
            .collect();

        Ok(DatasetPage {
            columns: self.columns.lock().unwrap().clone(),
            rows,
            pagination: PageInfo {
                current_page: page,
                total_pages,
                page_size: self.page_size,
                total_items,
            },
        })
    }

    async fn patch_column_type(
        &self,
        column_id: &str,
        dataset_id: &str,
        target_type: DataType,
    ) -> ApiResult<String> {
        self.calls.lock().unwrap().patches.push((
            column_id.to_string(),
            dataset_id.to_string(),
            target_type,
        ));
        let delay = *self.request_delay.lock().unwrap();
        pause(delay).await;
        let result = self
            .patches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::unexpected("no scripted patch")));

        if result.is_ok() {
            // The conversion job updates the stored column type
            for column in self.columns.lock().unwrap().iter_mut() {
                if column.id == column_id {
                    column.user_type = Some(target_type);
                }
            }
        }
        result
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
