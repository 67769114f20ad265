use std::{future::Future, sync::Arc};

use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{error::GeoError, fetch::RecordSource, marker::{MarkerRecord, Payload}};

/// Safety net against services that never report a last page.
pub const MAX_PAGES: u32 = 500;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Service reported status {0}")]
    Status(String),
}

impl From<ClientError> for GeoError {
    fn from(error: ClientError) -> Self {
        GeoError::UpstreamFetchFailure(error.to_string())
    }
}

/// `status` as sent by the service: a flag, an HTTP-like code or a word.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiStatus {
    Flag(bool),
    Code(u16),
    Text(String),
}

impl ApiStatus {
    pub fn is_success(&self) -> bool {
        match self {
            ApiStatus::Flag(flag) => *flag,
            ApiStatus::Code(code) => (200..300).contains(code),
            ApiStatus::Text(text) => matches!(
                text.to_ascii_lowercase().as_str(),
                "success" | "ok" | "true"
            ),
        }
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiStatus::Flag(flag) => write!(f, "{}", flag),
            ApiStatus::Code(code) => write!(f, "{}", code),
            ApiStatus::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pagination {
    #[serde(alias = "current_page", alias = "currentPage")]
    pub page: u32,
    #[serde(default, alias = "last_page", alias = "lastPage", alias = "total_pages")]
    pub last_page: Option<u32>,
    #[serde(default, alias = "perPage")]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.last_page.is_some_and(|last| self.page < last)
    }
}

/// Response body of every endpoint of the record service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: ApiStatus,
    pub data: T,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone)]
pub struct RecordServiceParams {
    pub base_url: String,
    pub token: Option<String>,
}

pub struct RecordServiceClient {
    params: RecordServiceParams,
    client: reqwest::Client,
}

impl RecordServiceClient {
    pub fn new(params: RecordServiceParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.params.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[instrument(skip(self))]
    pub async fn fetch_page<T>(&self, path: &str, page: u32) -> Result<ApiEnvelope<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let mut request = self.client.get(self.url(path)).query(&[("page", page)]);
        if let Some(token) = &self.params.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        let bytes = response.bytes().await?;
        parse_envelope(&bytes)
    }

    /// Follows the pagination of `path` until the last page, requesting at
    /// most [`MAX_PAGES`] pages.
    pub async fn fetch_all_pages<T>(&self, path: &str) -> Result<Vec<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1;

        for request in 1..=MAX_PAGES {
            let envelope: ApiEnvelope<Vec<T>> = self.fetch_page(path, page).await?;
            items.extend(envelope.data);

            let Some(pagination) = envelope.pagination.filter(Pagination::has_next) else {
                break;
            };

            if pagination.page < page {
                warn!(
                    "RecordService: asked {} for page {} but got page {}, stopping",
                    path, page, pagination.page
                );
                break;
            }

            if request == MAX_PAGES {
                warn!("RecordService: stopping {} after {} pages", path, MAX_PAGES);
                break;
            }

            page = pagination.page + 1;
        }

        debug!("RecordService: fetched {} items from {}", items.len(), path);

        Ok(items)
    }
}

pub fn parse_envelope<T>(body: &[u8]) -> Result<ApiEnvelope<T>, ClientError>
where
    T: DeserializeOwned,
{
    let envelope: ApiEnvelope<T> = serde_json::from_slice(body)?;

    if !envelope.status.is_success() {
        return Err(ClientError::Status(envelope.status.to_string()));
    }

    Ok(envelope)
}

/// One collection of the record service, e.g. `/api/sales`.
#[derive(Clone)]
pub struct RecordEndpoint {
    client: Arc<RecordServiceClient>,
    path: String,
}

impl RecordEndpoint {
    pub fn new(client: Arc<RecordServiceClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

impl RecordSource for RecordEndpoint {
    type Payload = Payload;

    fn fetch_records(
        &self,
    ) -> impl Future<Output = Result<Vec<MarkerRecord<Payload>>, GeoError>> + Send {
        let client = Arc::clone(&self.client);
        let path = self.path.clone();

        async move { Ok(client.fetch_all_pages(&path).await?) }
    }
}
