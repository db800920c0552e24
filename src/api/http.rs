//! HTTP dataset backend
//!
//! Implements [`DatasetApi`] against the REST API:
//!
//! | Method | Path                                   | Purpose         |
//! |--------|----------------------------------------|-----------------|
//! | POST   | `/datasets/`                           | upload file     |
//! | GET    | `/datasets/{datasetId}/status`         | poll task       |
//! | GET    | `/datasets/{datasetId}/`               | fetch a page    |
//! | PUT    | `/columns/{columnId}/type_conversion/` | override a type |
//!
//! ## Security
//!
//! Identifiers are validated and percent-encoded before they are placed in
//! a path, so a malformed id can never address another resource.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::wire::{self, Decoded, WireDataset, WireStatus, WireTask, WireUpload};
use super::{ApiError, ApiResult, DatasetApi, DatasetPage, UploadReceipt};
use crate::config::ClientConfig;
use crate::models::{DataType, TaskStatus};
use crate::validation::FileCandidate;

/// Maximum allowed length for identifiers placed in a path
const MAX_ID_LENGTH: usize = 128;

/// Validate an identifier for safe use in API paths.
///
/// Only alphanumeric characters, hyphens and underscores are allowed.
fn validate_path_segment(kind: &str, id: &str) -> ApiResult<()> {
    if id.is_empty() {
        return Err(ApiError::new(400, format!("{} cannot be empty", kind)));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ApiError::new(
            400,
            format!("{} too long (max {} characters)", kind, MAX_ID_LENGTH),
        ));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ApiError::new(
            400,
            format!(
                "{} contains invalid characters. Only alphanumeric, hyphens, and underscores are allowed.",
                kind
            ),
        ));
    }

    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypeConversionRequest<'a> {
    dataset_id: &'a str,
    target_type: &'a str,
}

/// Dataset backend that communicates with the HTTP API
#[derive(Debug, Clone)]
pub struct HttpDatasetApi {
    base_url: String,
    page_size: u32,
    client: reqwest::Client,
}

impl HttpDatasetApi {
    /// Create a new HTTP backend
    ///
    /// # Example
    ///
    /// ```rust
    /// use data_alchemy_sdk::api::HttpDatasetApi;
    /// use data_alchemy_sdk::config::ClientConfig;
    ///
    /// let api = HttpDatasetApi::new(&ClientConfig::default()).unwrap();
    /// assert_eq!(api.base_url(), "http://localhost:8000/api/v1");
    /// ```
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn dataset_path(dataset_id: &str, suffix: &str) -> ApiResult<String> {
        validate_path_segment("Dataset id", dataset_id)?;
        Ok(format!(
            "/datasets/{}/{}",
            urlencoding::encode(dataset_id),
            suffix
        ))
    }

    fn column_path(column_id: &str) -> ApiResult<String> {
        validate_path_segment("Column id", column_id)?;
        Ok(format!(
            "/columns/{}/type_conversion/",
            urlencoding::encode(column_id)
        ))
    }

    /// Send a request and decode the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ApiResult<Decoded<T>> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "Received API response");
        wire::decode_envelope(status, &body)
    }
}

#[async_trait]
impl DatasetApi for HttpDatasetApi {
    async fn upload(&self, file: &FileCandidate) -> ApiResult<UploadReceipt> {
        let bytes = file.read_bytes().await.map_err(|e| {
            ApiError::unexpected(format!("Failed to read {}: {}", file.name, e))
        })?;

        let mut part = reqwest::multipart::Part::bytes(bytes).file_name(file.name.clone());
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime)?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        debug!(file = %file.name, size = file.size, "Uploading dataset");
        let decoded: Decoded<WireUpload> = self
            .send(self.client.post(self.url("/datasets/")).multipart(form))
            .await?;
        if let Some(message) = &decoded.message {
            debug!(%message, "Upload accepted");
        }
        decoded.data.into_receipt()
    }

    async fn poll_status(&self, dataset_id: &str, task_id: &str) -> ApiResult<TaskStatus> {
        let path = Self::dataset_path(dataset_id, "status")?;
        debug!(dataset_id, task_id, "Polling task status");
        let decoded: Decoded<WireStatus> = self
            .send(
                self.client
                    .get(self.url(&path))
                    .query(&[("taskId", task_id)]),
            )
            .await?;
        decoded.data.into_status()
    }

    async fn fetch_dataset(&self, dataset_id: &str, page: u32) -> ApiResult<DatasetPage> {
        let path = Self::dataset_path(dataset_id, "")?;
        let page = page.max(1);
        debug!(dataset_id, page, "Fetching dataset page");
        let decoded: Decoded<WireDataset> = self
            .send(self.client.get(self.url(&path)).query(&[
                ("page", page.to_string()),
                ("page_size", self.page_size.to_string()),
            ]))
            .await?;
        wire::into_dataset_page(decoded, page, self.page_size)
    }

    async fn patch_column_type(
        &self,
        column_id: &str,
        dataset_id: &str,
        target_type: DataType,
    ) -> ApiResult<String> {
        let path = Self::column_path(column_id)?;
        validate_path_segment("Dataset id", dataset_id)?;
        debug!(column_id, dataset_id, %target_type, "Requesting type conversion");
        let body = TypeConversionRequest {
            dataset_id,
            target_type: target_type.as_backend(),
        };
        let decoded: Decoded<WireTask> = self
            .send(self.client.put(self.url(&path)).json(&body))
            .await?;
        decoded.data.into_task_id()
    }
}
