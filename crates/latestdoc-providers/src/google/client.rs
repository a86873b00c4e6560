//! Google Drive and Docs API client.

use latestdoc_core::{Document, DriveFileSummary};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::fetcher::{BoxFuture, DocumentSource, OrderBy};

use super::config::GoogleConfig;

/// Drive query selecting native Google Docs files.
const DOCUMENT_MIME_QUERY: &str = "mimeType='application/vnd.google-apps.document'";

/// Fields requested from `files.list`.
const LIST_FIELDS: &str = "files(id, name, createdTime, modifiedTime)";

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFileSummary>,
}

/// Authenticated client for the Drive v3 and Docs v1 APIs.
#[derive(Debug, Clone)]
pub struct GoogleDocsClient {
    http_client: reqwest::Client,
    access_token: String,
    drive_api_base: String,
    docs_api_base: String,
}

impl GoogleDocsClient {
    /// Creates a client using `access_token` and the endpoints of `config`.
    pub fn new(access_token: impl Into<String>, config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            drive_api_base: config.drive_api_base.trim_end_matches('/').to_string(),
            docs_api_base: config.docs_api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Lists at most one Google Docs file, newest first by `order_by`.
    pub async fn list_latest_files(&self, order_by: OrderBy) -> ProviderResult<Vec<DriveFileSummary>> {
        let url = format!("{}/files", self.drive_api_base);
        let request = self.http_client.get(&url).query(&[
            ("q", DOCUMENT_MIME_QUERY),
            ("orderBy", order_by.as_query()),
            ("pageSize", "1"),
            ("fields", LIST_FIELDS),
        ]);

        let list: FileListResponse = self.send_json(request, "Drive").await?;
        debug!(count = list.files.len(), order_by = %order_by, "listed documents");
        Ok(list.files)
    }

    /// Fetches a document with its structured body.
    pub async fn get_document(&self, document_id: &str) -> ProviderResult<Document> {
        let url = format!(
            "{}/documents/{}",
            self.docs_api_base,
            urlencoding::encode(document_id)
        );
        let request = self.http_client.get(&url);
        self.send_json(request, "Docs").await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        api: &str,
    ) -> ProviderResult<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("{api} API request timed out")
                } else if e.is_connect() {
                    format!("{api} API connection failed")
                } else {
                    format!("{api} API request failed")
                };
                ProviderError::remote_call(message).with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::remote_call(format!("failed to read {api} API response")).with_source(e)
        })?;

        if !status.is_success() {
            return Err(ProviderError::remote_call(format!(
                "{api} API error ({status}): {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse {api} API response"))
                .with_source(e)
        })
    }
}

impl DocumentSource for GoogleDocsClient {
    fn list_latest(&self, order_by: OrderBy) -> BoxFuture<'_, ProviderResult<Vec<DriveFileSummary>>> {
        Box::pin(self.list_latest_files(order_by))
    }

    fn get_document<'a>(&'a self, document_id: &'a str) -> BoxFuture<'a, ProviderResult<Document>> {
        Box::pin(GoogleDocsClient::get_document(self, document_id))
    }
}
