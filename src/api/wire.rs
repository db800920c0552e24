//! Backend payload decoding
//!
//! The backend wraps every response in an envelope
//! (`{status, message, code, data, errors, pagination}`) and has used more
//! than one spelling for identifiers, status names and column fields. This
//! module accepts all of them and produces the SDK's canonical types, so
//! nothing past the gateway ever sees a raw payload.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::{DatasetPage, UploadReceipt};
use crate::models::{ColumnMeta, DataType, PageInfo, Row, TaskState, TaskStatus};

/// Envelope as sent by the backend; `data` is decoded in a second step
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
    #[serde(default)]
    pagination: Option<WirePagination>,
}

/// Successfully decoded envelope
#[derive(Debug)]
pub(crate) struct Decoded<T> {
    pub data: T,
    pub pagination: Option<WirePagination>,
    pub message: Option<String>,
}

/// Decode a response body, turning error envelopes and non-2xx statuses into [`ApiError`]
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    http_status: u16,
    body: &[u8],
) -> ApiResult<Decoded<T>> {
    let http_ok = (200..300).contains(&http_status);

    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) if http_ok => return Err(e.into()),
        Err(_) => {
            return Err(ApiError::new(
                http_status,
                format!("Request failed with status {}", http_status),
            ));
        }
    };

    let status_error = envelope
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("error"));

    if status_error || !http_ok {
        let code = envelope
            .code
            .filter(|c| *c >= 400)
            .unwrap_or(if http_ok { 500 } else { http_status });
        let message = envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Request failed".to_string());
        let details = envelope.errors.map(error_details).unwrap_or_default();
        return Err(ApiError::new(code, message).with_details(details));
    }

    let data = serde_json::from_value(envelope.data.unwrap_or(Value::Null))?;
    Ok(Decoded {
        data,
        pagination: envelope.pagination,
        message: envelope.message,
    })
}

/// Flatten an `errors` value into field -> messages
fn error_details(errors: Value) -> BTreeMap<String, Vec<String>> {
    fn messages(value: Value) -> Vec<String> {
        match value {
            Value::Null => Vec::new(),
            Value::String(s) => vec![s],
            Value::Array(items) => items.into_iter().flat_map(messages).collect(),
            other => vec![other.to_string()],
        }
    }

    match errors {
        Value::Object(map) => map
            .into_iter()
            .map(|(field, value)| (field, messages(value)))
            .filter(|(_, msgs)| !msgs.is_empty())
            .collect(),
        Value::Null => BTreeMap::new(),
        other => BTreeMap::from([("detail".to_string(), messages(other))]),
    }
}

/// Identifiers arrive as strings or integers
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct WireDatasetRef {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
}

/// Data of the upload response
#[derive(Debug, Deserialize)]
pub(crate) struct WireUpload {
    #[serde(
        default,
        rename = "taskId",
        alias = "task_id",
        deserialize_with = "deserialize_id"
    )]
    task_id: Option<String>,
    #[serde(
        default,
        rename = "datasetId",
        alias = "dataset_id",
        alias = "fileId",
        alias = "file_id",
        deserialize_with = "deserialize_id"
    )]
    dataset_id: Option<String>,
    #[serde(default)]
    dataset: Option<WireDatasetRef>,
}

impl WireUpload {
    pub(crate) fn into_receipt(self) -> ApiResult<UploadReceipt> {
        let task_id = self
            .task_id
            .ok_or_else(|| ApiError::unexpected("Upload response is missing taskId"))?;
        let dataset_id = self
            .dataset_id
            .or_else(|| self.dataset.and_then(|d| d.id))
            .ok_or_else(|| ApiError::unexpected("Upload response is missing datasetId"))?;
        Ok(UploadReceipt {
            task_id,
            dataset_id,
        })
    }
}

/// Data of the type conversion response
#[derive(Debug, Deserialize)]
pub(crate) struct WireTask {
    #[serde(
        default,
        rename = "taskId",
        alias = "task_id",
        deserialize_with = "deserialize_id"
    )]
    task_id: Option<String>,
}

impl WireTask {
    pub(crate) fn into_task_id(self) -> ApiResult<String> {
        self.task_id
            .ok_or_else(|| ApiError::unexpected("Type conversion response is missing taskId"))
    }
}

/// Data of the status response (Celery task metadata)
#[derive(Debug, Deserialize)]
pub(crate) struct WireStatus {
    #[serde(default, alias = "state")]
    status: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

impl WireStatus {
    pub(crate) fn into_status(self) -> ApiResult<TaskStatus> {
        let raw = self.status.unwrap_or_default();
        let state = TaskState::from_backend(&raw)
            .ok_or_else(|| ApiError::unexpected(format!("Unrecognized task status: {}", raw)))?;

        let result_progress = self
            .result
            .as_ref()
            .and_then(|r| r.get("progress"))
            .and_then(Value::as_f64);
        let progress = match self.progress.or(result_progress) {
            Some(p) if p.is_finite() => p.round().clamp(0.0, 100.0) as u8,
            _ if state == TaskState::Succeeded => 100,
            _ => 0,
        };

        let stage = self
            .result
            .as_ref()
            .and_then(|r| r.get("current_stage"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let failure = match (&self.result, state) {
            (Some(Value::String(reason)), TaskState::Failed) => Some(reason.clone()),
            _ => None,
        };

        Ok(TaskStatus {
            state,
            progress,
            message: self.message.or(stage).or(failure),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireColumn {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    name: String,
    #[serde(
        default,
        rename = "columnIndex",
        alias = "column_index",
        alias = "position"
    )]
    column_index: Option<u32>,
    #[serde(rename = "inferredType", alias = "inferred_type")]
    inferred_type: String,
    #[serde(
        default,
        rename = "userType",
        alias = "customUserType",
        alias = "current_type",
        alias = "currentType"
    )]
    user_type: Option<String>,
}

impl WireColumn {
    fn into_column(self, position: usize) -> ApiResult<ColumnMeta> {
        let parse = |raw: &str| {
            DataType::from_backend(raw).ok_or_else(|| {
                ApiError::unexpected(format!(
                    "Unknown data type '{}' for column '{}'",
                    raw, self.name
                ))
            })
        };

        let inferred_type = parse(&self.inferred_type)?;
        let user_type = match self.user_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse(raw)?),
        };

        Ok(ColumnMeta {
            id: self.id.unwrap_or_else(|| self.name.clone()),
            column_index: self.column_index.unwrap_or(position as u32),
            name: self.name,
            inferred_type,
            user_type,
        })
    }
}

/// Data of the dataset page response
#[derive(Debug, Deserialize)]
pub(crate) struct WireDataset {
    #[serde(default)]
    columns: Option<Vec<WireColumn>>,
    #[serde(default)]
    rows: Option<Vec<Row>>,
}

/// Pagination block of the dataset page response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WirePagination {
    #[serde(default, alias = "currentPage")]
    current_page: Option<u32>,
    #[serde(default, alias = "totalPages")]
    total_pages: Option<u32>,
    #[serde(default, alias = "pageSize")]
    page_size: Option<u32>,
    #[serde(default, alias = "total_items", alias = "totalItems")]
    count: Option<u64>,
}

impl WirePagination {
    fn into_page_info(self, requested_page: u32, default_page_size: u32, row_count: usize) -> PageInfo {
        let page_size = self
            .page_size
            .filter(|s| *s > 0)
            .unwrap_or(default_page_size.max(1));
        let total_items = self.count.unwrap_or(row_count as u64);
        let total_pages = self
            .total_pages
            .unwrap_or_else(|| total_items.div_ceil(page_size as u64) as u32);

        let mut info = PageInfo {
            current_page: 1,
            total_pages,
            page_size,
            total_items,
        };
        info.current_page = info.clamp_page(self.current_page.unwrap_or(requested_page));
        info
    }
}

/// Build a [`DatasetPage`] from a decoded dataset response
///
/// Columns and rows must both be present; column names must be unique.
pub(crate) fn into_dataset_page(
    decoded: Decoded<WireDataset>,
    requested_page: u32,
    default_page_size: u32,
) -> ApiResult<DatasetPage> {
    let wire_columns = decoded
        .data
        .columns
        .ok_or_else(|| ApiError::unexpected("Dataset response is missing columns"))?;
    let rows = decoded
        .data
        .rows
        .ok_or_else(|| ApiError::unexpected("Dataset response is missing rows"))?;

    let mut columns = wire_columns
        .into_iter()
        .enumerate()
        .map(|(position, column)| column.into_column(position))
        .collect::<ApiResult<Vec<_>>>()?;
    columns.sort_by_key(|c| c.column_index);

    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.name.as_str())) {
        return Err(ApiError::unexpected(format!(
            "Dataset response has duplicate column '{}'",
            dup.name
        )));
    }

    let pagination = decoded.pagination.unwrap_or_default().into_page_info(
        requested_page,
        default_page_size,
        rows.len(),
    );

    Ok(DatasetPage {
        columns,
        rows,
        pagination,
    })
}
